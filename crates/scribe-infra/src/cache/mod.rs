//! Snapshot stores behind the `Cache` port: file (durable), memory, Redis.

mod file;
mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use file::{DEFAULT_CACHE_DIR, FileCache};
pub use memory::InMemoryCache;
#[cfg(feature = "redis")]
pub use self::redis::{RedisCache, RedisConfig};
