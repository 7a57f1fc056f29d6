use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

/// Persistent backend selected by `RECALL_CACHE_BACKEND`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Fs,
    Redis,
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fs" => Ok(BackendKind::Fs),
            "redis" => Ok(BackendKind::Redis),
            other => Err(Error::UnknownBackend(other.to_string())),
        }
    }
}

/// Backend configuration gathered from `RECALL_CACHE_*` environment variables.
pub struct CacheSettings {
    pub backend: BackendKind,
    pub fs_root: PathBuf,
    pub server: Option<String>,
    pub port: u16,
    pub socket: Option<PathBuf>,
    pub password: Option<String>,
    pub prefix: Option<String>,
}

impl CacheSettings {
    const DEFAULT_BACKEND: &str = "fs";
    const DEFAULT_DIR_NAME: &str = ".recall-cache";
    const DEFAULT_PORT: u16 = 6379;

    /// Read settings from the environment.
    ///
    /// `RECALL_CACHE_BACKEND` defaults to `fs`. The filesystem backend uses
    /// `RECALL_CACHE_PATH` (default `$HOME/.recall-cache`). The redis backend
    /// uses `RECALL_CACHE_SERVER` plus `RECALL_CACHE_PORT` (default 6379), or
    /// `RECALL_CACHE_SOCKET` when no server is set, with optional
    /// `RECALL_CACHE_PASSWORD` and `RECALL_CACHE_PREFIX`.
    pub fn from_env() -> Result<Self> {
        let backend = std::env::var("RECALL_CACHE_BACKEND")
            .unwrap_or_else(|_| Self::DEFAULT_BACKEND.to_string())
            .parse::<BackendKind>()?;

        let fs_root = std::env::var("RECALL_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                Path::new(&home).join(Self::DEFAULT_DIR_NAME)
            });

        let port = std::env::var("RECALL_CACHE_PORT")
            .unwrap_or_else(|_| Self::DEFAULT_PORT.to_string())
            .parse::<u16>()
            .unwrap_or_else(|_| {
                warn!(
                    "RECALL_CACHE_PORT is not a valid port, using {}",
                    Self::DEFAULT_PORT
                );
                Self::DEFAULT_PORT
            });

        Ok(Self {
            backend,
            fs_root,
            server: std::env::var("RECALL_CACHE_SERVER").ok(),
            port,
            socket: std::env::var("RECALL_CACHE_SOCKET").ok().map(PathBuf::from),
            password: std::env::var("RECALL_CACHE_PASSWORD").ok(),
            prefix: std::env::var("RECALL_CACHE_PREFIX").ok(),
        })
    }
}
