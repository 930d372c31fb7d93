//! # Scribe Infrastructure
//!
//! Concrete implementations of the ports defined in `scribe-core`: the hosted
//! backend over HTTP, an in-memory backend, and snapshot stores.
//!
//! ## Feature Flags
//!
//! - `redis` - Redis snapshot store

pub mod backend;
pub mod cache;
pub mod memory;

// Re-exports - hosted backend
pub use backend::{
    BackendClient, BackendConfig, BucketObjectStore, DocumentCommentRepository,
    DocumentPostRepository, HttpFunctionInvoker,
};

// Re-exports - in-memory
pub use cache::{FileCache, InMemoryCache};
pub use memory::{
    InMemoryCommentRepository, InMemoryObjectStore, InMemoryPostRepository, InMemoryUserDirectory,
};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
