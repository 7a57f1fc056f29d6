// Public API
pub mod context;
pub mod key;
pub mod persistent;
pub mod ports;
pub mod transient;

// Re-export commonly used types
pub use key::{MappedArgs, TransientKey, legible_key};
pub use ports::{Codec, JsonCodec, PersistentCache};
pub use transient::{BoundedCache, CacheManager};
