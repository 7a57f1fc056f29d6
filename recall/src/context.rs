use crate::ports::PersistentCache;
use std::future::Future;
use std::sync::Arc;

tokio::task_local! {
    static ACTIVE_BACKEND: Option<Arc<dyn PersistentCache>>;
}

/// Run `fut` with `backend` bound as the active persistent cache.
///
/// The binding is scoped to the future and to the current task: concurrent
/// tasks never observe it, and the previous binding (if any) is restored on
/// every exit path, including panics unwinding through the scope. Scopes
/// nest, with the innermost binding winning.
pub async fn caching_into<F>(backend: Arc<dyn PersistentCache>, fut: F) -> F::Output
where
    F: Future,
{
    ACTIVE_BACKEND.scope(Some(backend), fut).await
}

/// Run `fut` with persistent caching disabled, even inside an enclosing
/// [`caching_into`] scope.
pub async fn caching_disabled<F>(fut: F) -> F::Output
where
    F: Future,
{
    ACTIVE_BACKEND.scope(None, fut).await
}

/// The backend bound to the current task, if any. Outside any scope this is
/// `None` and memoized calls run uncached.
pub fn current() -> Option<Arc<dyn PersistentCache>> {
    ACTIVE_BACKEND.try_with(|active| active.clone()).ok().flatten()
}
