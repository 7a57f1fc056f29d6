// shared/src/lib.rs

use std::num::NonZeroUsize;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid cache capacity: {0}")]
    InvalidCapacity(usize),
    #[error("cache root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("invalid cache backend: {0}")]
    UnknownBackend(String),
    #[error("no redis connection information specified")]
    MissingConnectionInfo,
    #[error("backend: {0}")]
    Backend(String),
    #[error("codec: {0}")]
    Codec(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Entry limit for a bounded cache: at least one entry, or no limit at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capacity(Option<NonZeroUsize>);

impl Capacity {
    pub const UNBOUNDED: Capacity = Capacity(None);
    pub const DEFAULT_LIMIT: usize = 5;

    /// Limit to `limit` entries. Zero is rejected.
    pub fn bounded(limit: usize) -> Result<Self> {
        match NonZeroUsize::new(limit) {
            Some(n) => Ok(Self(Some(n))),
            None => Err(Error::InvalidCapacity(limit)),
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.0.map(NonZeroUsize::get)
    }

    pub fn is_unbounded(&self) -> bool {
        self.0.is_none()
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Self(NonZeroUsize::new(Self::DEFAULT_LIMIT))
    }
}

pub mod config;
