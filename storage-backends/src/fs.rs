use async_trait::async_trait;
use recall::ports::{Codec, JsonCodec, PersistentCache};
use serde_json::Value;
use sha2::{Digest, Sha256};
use shared::{Error, Result};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Filesystem-backed persistent cache
///
/// Stores one file per key under the configured root directory. File names
/// are the hex digest of the legible key, so keys of any shape map to safe,
/// stable names; the extension comes from the codec. Writes go to a
/// temporary file first and are renamed into place, so a reader never
/// observes a partially written value.
pub struct FsCache {
    root: PathBuf,
    codec: Arc<dyn Codec>,
}

impl FsCache {
    /// Open a cache rooted at `root` with the default JSON codec.
    ///
    /// The directory is created if missing (including parents). A root that
    /// exists but is not a directory is a configuration error.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Self::with_codec(root, Arc::new(JsonCodec))
    }

    /// Open a cache rooted at `root` using `codec` for stored values.
    pub fn with_codec(root: impl Into<PathBuf>, codec: Arc<dyn Codec>) -> Result<Self> {
        let root = root.into();

        if root.exists() {
            if !root.is_dir() {
                return Err(Error::NotADirectory(root));
            }
        } else {
            std::fs::create_dir_all(&root)?;
        }

        Ok(Self { root, codec })
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.root
            .join(format!("{}.{}", hex::encode(digest), self.codec.name()))
    }
}

#[async_trait]
impl PersistentCache for FsCache {
    fn label(&self) -> &str {
        "fs"
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };
        if !metadata.is_file() {
            return Ok(None);
        }

        let bytes = tokio::fs::read(&path).await?;
        match self.codec.decode(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(
                    "Discarding unreadable cache entry at {}: {}",
                    path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &Value) -> Result<()> {
        let bytes = self.codec.encode(value)?;
        let path = self.path_for(key);

        // Write-then-rename keeps the overwrite atomic for readers
        let staging = self.root.join(format!(".{}.tmp", Uuid::new_v4()));
        tokio::fs::write(&staging, &bytes).await?;
        tokio::fs::rename(&staging, &path).await?;

        Ok(())
    }
}

impl std::fmt::Debug for FsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsCache")
            .field("root", &self.root)
            .field("codec", &self.codec.name())
            .finish()
    }
}
