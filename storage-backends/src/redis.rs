use async_trait::async_trait;
use recall::key::{MappedArgs, legible_key};
use recall::ports::{Codec, JsonCodec, PersistentCache};
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Where the redis server listens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedisTarget {
    Tcp { host: String, port: u16 },
    Unix { path: PathBuf },
}

/// Connection parameters for [`RedisCache`].
///
/// The configuration alone is enough to rebuild a working backend, which is
/// what makes the backend itself relocatable across process boundaries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisConfig {
    pub target: RedisTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl RedisConfig {
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self {
            target: RedisTarget::Tcp {
                host: host.into(),
                port,
            },
            password: None,
            prefix: None,
        }
    }

    pub fn unix(path: impl Into<PathBuf>) -> Self {
        Self {
            target: RedisTarget::Unix { path: path.into() },
            password: None,
            prefix: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Namespace keys in the shared store as `prefix-<key>`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    fn connection_url(&self) -> String {
        match &self.target {
            RedisTarget::Tcp { host, port } => match &self.password {
                Some(password) => format!("redis://:{}@{}:{}", password, host, port),
                None => format!("redis://{}:{}", host, port),
            },
            RedisTarget::Unix { path } => match &self.password {
                Some(password) => format!("redis+unix://{}?pass={}", path.display(), password),
                None => format!("redis+unix://{}", path.display()),
            },
        }
    }
}

/// Redis-backed persistent cache
///
/// Connections are established lazily, one multiplexed connection per
/// operation batch, so constructing the backend never touches the network
/// and a relocated instance reconnects on its next use. The backend
/// serializes as its [`RedisConfig`] and deserializes back into a working
/// instance (with the default codec).
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "RedisConfig", into = "RedisConfig")]
pub struct RedisCache {
    config: RedisConfig,
    client: Client,
    codec: Arc<dyn Codec>,
}

impl RedisCache {
    /// Build a backend from connection parameters with the default JSON
    /// codec. No connection is attempted until the first operation.
    pub fn from_config(config: RedisConfig) -> Result<Self> {
        Self::with_codec(config, Arc::new(JsonCodec))
    }

    /// Build a backend using `codec` for stored values.
    pub fn with_codec(config: RedisConfig, codec: Arc<dyn Codec>) -> Result<Self> {
        let client = Client::open(config.connection_url().as_str())
            .map_err(|e| Error::Backend(format!("Failed to create redis client: {}", e)))?;

        Ok(Self {
            config,
            client,
            codec,
        })
    }

    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::Backend(format!("Failed to connect to redis: {}", e)))
    }
}

#[async_trait]
impl PersistentCache for RedisCache {
    fn label(&self) -> &str {
        "redis"
    }

    fn key(&self, namespace: &str, args: &MappedArgs) -> String {
        let key = legible_key(namespace, args);
        match &self.config.prefix {
            Some(prefix) => format!("{}-{}", prefix, key),
            None => key,
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut conn = self.connection().await?;

        let bytes: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| Error::Backend(format!("Redis GET failed: {}", e)))?;

        match bytes {
            Some(bytes) => match self.codec.decode(&bytes) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    warn!("Discarding unreadable cache entry '{}': {}", key, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &Value) -> Result<()> {
        let bytes = self.codec.encode(value)?;
        let mut conn = self.connection().await?;

        let result: redis::RedisResult<()> = conn.set(key, bytes).await;
        result.map_err(|e| Error::Backend(format!("Redis SET failed: {}", e)))
    }
}

impl TryFrom<RedisConfig> for RedisCache {
    type Error = Error;

    fn try_from(config: RedisConfig) -> Result<Self> {
        Self::from_config(config)
    }
}

impl From<RedisCache> for RedisConfig {
    fn from(cache: RedisCache) -> Self {
        cache.config
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("target", &self.config.target)
            .field("prefix", &self.config.prefix)
            .finish()
    }
}
