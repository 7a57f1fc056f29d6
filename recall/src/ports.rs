#![deny(clippy::all)]

use crate::key::{MappedArgs, legible_key};
use async_trait::async_trait;
use serde_json::Value;
use shared::{Error, Result};

// Ports are the pluggable extension points for persistent storage and
// value encoding

/// Port for durable key-value storage of cached results
///
/// Implementations map legible keys to encoded values that outlive the
/// process. Reachability problems (network, permissions, I/O) are errors;
/// stored data that can no longer be decoded is reported as absent so a
/// corrupted entry degrades to a recomputation instead of a failure.
#[async_trait]
pub trait PersistentCache: Send + Sync + 'static {
    /// Short diagnostic name for the backend ("fs", "redis", ...)
    fn label(&self) -> &str;

    /// Derive the storage key for a namespace and its mapped arguments.
    /// Backends may override this to apply store-specific conventions,
    /// such as a key prefix.
    fn key(&self, namespace: &str, args: &MappedArgs) -> String {
        legible_key(namespace, args)
    }

    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &Value) -> Result<()>;
}

/// Port for turning values into stored bytes and back
///
/// `decode` failures are how backends detect corrupt entries, so codecs
/// must fail cleanly on malformed input.
pub trait Codec: Send + Sync + 'static {
    /// Short format name, also used as the filesystem extension
    fn name(&self) -> &'static str;

    fn encode(&self, value: &Value) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<Value>;
}

/// JSON codec used by default in every backend
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| Error::Codec(format!("Failed to encode value: {}", e)))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::Codec(format!("Failed to decode value: {}", e)))
    }
}
