// Public API
pub mod fs;
pub mod redis;

// Re-export commonly used types
pub use self::fs::FsCache;
pub use self::redis::{RedisCache, RedisConfig, RedisTarget};

use recall::ports::PersistentCache;
use shared::config::{BackendKind, CacheSettings};
use shared::{Error, Result};
use std::sync::Arc;

/// Build the persistent backend described by `settings`.
pub fn from_settings(settings: &CacheSettings) -> Result<Arc<dyn PersistentCache>> {
    match settings.backend {
        BackendKind::Fs => Ok(Arc::new(FsCache::new(&settings.fs_root)?)),
        BackendKind::Redis => {
            let config = redis_config(settings)?;
            Ok(Arc::new(RedisCache::from_config(config)?))
        }
    }
}

/// Derive redis connection parameters from settings. A configured server
/// wins over a socket path; configuring neither is an error.
fn redis_config(settings: &CacheSettings) -> Result<RedisConfig> {
    let mut config = if let Some(server) = &settings.server {
        RedisConfig::tcp(server.clone(), settings.port)
    } else if let Some(socket) = &settings.socket {
        RedisConfig::unix(socket.clone())
    } else {
        return Err(Error::MissingConnectionInfo);
    };

    if let Some(password) = &settings.password {
        config = config.with_password(password.clone());
    }
    if let Some(prefix) = &settings.prefix {
        config = config.with_prefix(prefix.clone());
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn settings(backend: BackendKind) -> CacheSettings {
        CacheSettings {
            backend,
            fs_root: PathBuf::from("/tmp/unused"),
            server: None,
            port: 6379,
            socket: None,
            password: None,
            prefix: None,
        }
    }

    #[test]
    fn test_fs_backend_from_settings() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(BackendKind::Fs);
        settings.fs_root = dir.path().join("cache");

        let backend = from_settings(&settings).unwrap();
        assert_eq!(backend.label(), "fs");
        assert!(settings.fs_root.is_dir());
    }

    #[test]
    fn test_the_server_wins_over_the_socket() {
        let mut settings = settings(BackendKind::Redis);
        settings.server = Some("cache.internal".to_string());
        settings.port = 6400;
        settings.socket = Some(PathBuf::from("/var/run/redis.sock"));

        let config = redis_config(&settings).unwrap();
        assert_eq!(
            config.target,
            RedisTarget::Tcp {
                host: "cache.internal".to_string(),
                port: 6400
            }
        );
    }

    #[test]
    fn test_the_socket_is_used_without_a_server() {
        let mut settings = settings(BackendKind::Redis);
        settings.socket = Some(PathBuf::from("/var/run/redis.sock"));

        let config = redis_config(&settings).unwrap();
        assert_eq!(
            config.target,
            RedisTarget::Unix {
                path: PathBuf::from("/var/run/redis.sock")
            }
        );
    }

    #[test]
    fn test_password_and_prefix_carry_over() {
        let mut settings = settings(BackendKind::Redis);
        settings.server = Some("cache.internal".to_string());
        settings.password = Some("hunter2".to_string());
        settings.prefix = Some("analysis".to_string());

        let config = redis_config(&settings).unwrap();
        assert_eq!(config.password.as_deref(), Some("hunter2"));
        assert_eq!(config.prefix.as_deref(), Some("analysis"));
    }

    #[test]
    fn test_redis_requires_connection_information() {
        let result = from_settings(&settings(BackendKind::Redis));
        assert!(matches!(result, Err(Error::MissingConnectionInfo)));
    }

    #[test]
    fn test_redis_backend_from_settings() {
        let mut settings = settings(BackendKind::Redis);
        settings.server = Some("127.0.0.1".to_string());

        let backend = from_settings(&settings).unwrap();
        assert_eq!(backend.label(), "redis");
    }
}
