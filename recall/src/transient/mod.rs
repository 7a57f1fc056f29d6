// Public API
pub mod bounded;
pub mod manager;
pub mod memo;

// Re-export commonly used types
pub use bounded::BoundedCache;
pub use manager::CacheManager;
pub use memo::{CallOptions, Memoized};
