use crate::key::{MappedArgs, TransientKey};
use crate::transient::CacheManager;
use crate::transient::manager::lock;
use std::sync::Arc;
use tracing::debug;

/// Per-call controls for a transiently memoized function.
#[derive(Clone, Debug, Default)]
pub struct CallOptions {
    /// Route the call through a different named cache.
    pub cache: Option<String>,
    /// Always run the computation and leave the cache untouched.
    pub bypass: bool,
}

/// Memoizes a synchronous computation through a named in-memory cache.
///
/// The wrapper owns the cache name, the key-mapping function, and the
/// computation; the manager owns the cache itself. Two calls whose mapped
/// arguments render identically share one entry. The cache lock is not held
/// while the computation runs, so concurrent first calls may compute the
/// same value twice; the last writer wins.
pub struct Memoized<V, M, F> {
    name: String,
    manager: Arc<CacheManager<V>>,
    mapper: M,
    compute: F,
}

impl<V, M, F> Memoized<V, M, F>
where
    V: Clone,
{
    pub fn new(
        name: impl Into<String>,
        manager: Arc<CacheManager<V>>,
        mapper: M,
        compute: F,
    ) -> Self {
        Self {
            name: name.into(),
            manager,
            mapper,
            compute,
        }
    }

    pub fn call<A>(&self, args: &A) -> V
    where
        M: Fn(&A) -> MappedArgs,
        F: Fn(&A) -> V,
    {
        self.call_with(args, CallOptions::default())
    }

    pub fn call_with<A>(&self, args: &A, opts: CallOptions) -> V
    where
        M: Fn(&A) -> MappedArgs,
        F: Fn(&A) -> V,
    {
        if opts.bypass {
            return (self.compute)(args);
        }

        let name = opts.cache.as_deref().unwrap_or(&self.name);
        let key = TransientKey::derive(name, &(self.mapper)(args));
        let cache = self.manager.get(name);

        if let Some(value) = lock(&cache).get(&key) {
            debug!("transient cache hit in '{}'", name);
            return value;
        }
        debug!("transient cache miss in '{}'", name);

        let value = (self.compute)(args);
        lock(&cache).set(key, value.clone());
        value
    }
}
