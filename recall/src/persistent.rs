use crate::context;
use crate::key::MappedArgs;
use crate::ports::PersistentCache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-call controls for a persistently memoized function.
#[derive(Clone, Default)]
pub struct CallOptions {
    /// Use this backend instead of the one bound to the task context.
    pub backend: Option<Arc<dyn PersistentCache>>,
    /// Always run the computation and leave the backend untouched.
    pub bypass: bool,
}

/// Memoizes an asynchronous computation through a persistent backend.
///
/// Each call resolves its backend from the task context (see
/// [`crate::context::caching_into`]) unless one is supplied per call; with
/// no backend bound the computation simply runs uncached. Results are
/// bridged through JSON values, so the result type must round-trip through
/// serde. A stored value that no longer matches the result type is treated
/// like any other corrupt entry: discarded and recomputed.
///
/// The computation receives the call arguments by reference and must return
/// an owned future.
pub struct Memoized<M, F> {
    namespace: String,
    mapper: M,
    compute: F,
}

impl<M, F> Memoized<M, F> {
    pub fn new(namespace: impl Into<String>, mapper: M, compute: F) -> Self {
        Self {
            namespace: namespace.into(),
            mapper,
            compute,
        }
    }

    pub async fn call<A, T, Fut>(&self, args: &A) -> Result<T>
    where
        M: Fn(&A) -> MappedArgs,
        F: Fn(&A) -> Fut,
        Fut: Future<Output = T>,
        T: Serialize + DeserializeOwned,
    {
        self.call_with(args, CallOptions::default()).await
    }

    pub async fn call_with<A, T, Fut>(&self, args: &A, opts: CallOptions) -> Result<T>
    where
        M: Fn(&A) -> MappedArgs,
        F: Fn(&A) -> Fut,
        Fut: Future<Output = T>,
        T: Serialize + DeserializeOwned,
    {
        if opts.bypass {
            return Ok((self.compute)(args).await);
        }

        let Some(backend) = opts.backend.or_else(context::current) else {
            return Ok((self.compute)(args).await);
        };

        let key = backend.key(&self.namespace, &(self.mapper)(args));

        if let Some(stored) = backend.get(&key).await? {
            match serde_json::from_value::<T>(stored) {
                Ok(value) => {
                    debug!("persistent cache hit for '{}' on {}", key, backend.label());
                    return Ok(value);
                }
                Err(e) => {
                    warn!("Discarding cache entry '{}' with unexpected shape: {}", key, e);
                }
            }
        } else {
            debug!("persistent cache miss for '{}' on {}", key, backend.label());
        }

        let computed = (self.compute)(args).await;
        let value = serde_json::to_value(&computed)
            .map_err(|e| Error::Codec(format!("Failed to encode result: {}", e)))?;
        backend.set(&key, &value).await?;

        Ok(computed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory stand-in for a durable store.
    #[derive(Default)]
    struct MemoryBackend {
        entries: Mutex<HashMap<String, Value>>,
        fail_get: bool,
    }

    impl MemoryBackend {
        fn shared() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                fail_get: true,
                ..Self::default()
            })
        }

        fn insert(&self, key: &str, value: Value) {
            self.entries.lock().unwrap().insert(key.to_string(), value);
        }

        fn len(&self) -> usize {
            self.entries.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PersistentCache for MemoryBackend {
        fn label(&self) -> &str {
            "memory"
        }

        async fn get(&self, key: &str) -> Result<Option<Value>> {
            if self.fail_get {
                return Err(Error::Backend("store unreachable".to_string()));
            }
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &Value) -> Result<()> {
            self.insert(key, value.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_runs_uncached_without_a_backend() {
        let calls = AtomicUsize::new(0);
        let add = Memoized::new(
            "add",
            |args: &(i32, i32)| MappedArgs::new().arg(args.0).arg(args.1),
            |args: &(i32, i32)| {
                calls.fetch_add(1, Ordering::SeqCst);
                let total = args.0 + args.1;
                async move { total }
            },
        );

        assert_eq!(add.call(&(1, 2)).await.unwrap(), 3);
        assert_eq!(add.call(&(1, 2)).await.unwrap(), 3);

        // No backend bound, so every call computes
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_memoizes_through_the_context_backend() {
        let backend = MemoryBackend::shared();
        let calls = AtomicUsize::new(0);
        let add = Memoized::new(
            "add",
            |args: &(i32, i32)| MappedArgs::new().arg(args.0).arg(args.1),
            |args: &(i32, i32)| {
                calls.fetch_add(1, Ordering::SeqCst);
                let total = args.0 + args.1;
                async move { total }
            },
        );

        context::caching_into(backend.clone(), async {
            assert_eq!(add.call(&(1, 2)).await.unwrap(), 3);
            assert_eq!(add.call(&(1, 2)).await.unwrap(), 3);
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_keys_by_namespace_and_arguments() {
        let backend = MemoryBackend::shared();
        let add = Memoized::new(
            "add",
            |args: &(i32, i32)| MappedArgs::new().arg(args.0).arg(args.1),
            |args: &(i32, i32)| {
                let total = args.0 + args.1;
                async move { total }
            },
        );

        context::caching_into(backend.clone(), async {
            add.call(&(1, 2)).await.unwrap();
        })
        .await;

        let entries = backend.entries.lock().unwrap();
        assert!(entries.contains_key("add(1, 2)"));
    }

    #[tokio::test]
    async fn test_bypass_computes_and_skips_the_backend() {
        let backend = MemoryBackend::shared();
        let calls = AtomicUsize::new(0);
        let add = Memoized::new(
            "add",
            |args: &(i32, i32)| MappedArgs::new().arg(args.0).arg(args.1),
            |args: &(i32, i32)| {
                calls.fetch_add(1, Ordering::SeqCst);
                let total = args.0 + args.1;
                async move { total }
            },
        );

        context::caching_into(backend.clone(), async {
            let opts = CallOptions {
                bypass: true,
                ..CallOptions::default()
            };
            assert_eq!(add.call_with(&(1, 2), opts.clone()).await.unwrap(), 3);
            assert_eq!(add.call_with(&(1, 2), opts).await.unwrap(), 3);
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(backend.len(), 0);
    }

    #[tokio::test]
    async fn test_per_call_backend_overrides_the_context() {
        let scoped = MemoryBackend::shared();
        let explicit = MemoryBackend::shared();
        let add = Memoized::new(
            "add",
            |args: &(i32, i32)| MappedArgs::new().arg(args.0).arg(args.1),
            |args: &(i32, i32)| {
                let total = args.0 + args.1;
                async move { total }
            },
        );

        context::caching_into(scoped.clone(), async {
            let opts = CallOptions {
                backend: Some(explicit.clone() as Arc<dyn PersistentCache>),
                ..CallOptions::default()
            };
            add.call_with(&(1, 2), opts).await.unwrap();
        })
        .await;

        assert_eq!(scoped.len(), 0);
        assert_eq!(explicit.len(), 1);
    }

    #[tokio::test]
    async fn test_entry_with_unexpected_shape_is_recomputed() {
        let backend = MemoryBackend::shared();
        backend.insert("add(1, 2)", json!({"not": "a number"}));

        let calls = AtomicUsize::new(0);
        let add = Memoized::new(
            "add",
            |args: &(i32, i32)| MappedArgs::new().arg(args.0).arg(args.1),
            |args: &(i32, i32)| {
                calls.fetch_add(1, Ordering::SeqCst);
                let total = args.0 + args.1;
                async move { total }
            },
        );

        let result = context::caching_into(backend.clone(), add.call(&(1, 2))).await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // The recomputed value replaced the malformed entry
        let entries = backend.entries.lock().unwrap();
        assert_eq!(entries.get("add(1, 2)"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn test_backend_failures_propagate() {
        let backend = MemoryBackend::unreachable();
        let add = Memoized::new(
            "add",
            |args: &(i32, i32)| MappedArgs::new().arg(args.0).arg(args.1),
            |args: &(i32, i32)| {
                let total = args.0 + args.1;
                async move { total }
            },
        );

        let result = context::caching_into(backend, add.call(&(1, 2))).await;
        assert!(matches!(result, Err(Error::Backend(_))));
    }

    #[tokio::test]
    async fn test_backend_failures_do_not_reach_bypassed_calls() {
        let backend = MemoryBackend::unreachable();
        let add = Memoized::new(
            "add",
            |args: &(i32, i32)| MappedArgs::new().arg(args.0).arg(args.1),
            |args: &(i32, i32)| {
                let total = args.0 + args.1;
                async move { total }
            },
        );

        let result = context::caching_into(backend, async {
            let opts = CallOptions {
                bypass: true,
                ..CallOptions::default()
            };
            add.call_with(&(1, 2), opts).await
        })
        .await;

        assert_eq!(result.unwrap(), 3);
    }
}
