//! HTTP adapters for the hosted backend: documents, storage bucket, functions.

mod client;
mod config;
mod documents;
mod functions;
mod storage;

pub use client::BackendClient;
pub use config::{BackendConfig, ConfigError, DEFAULT_LIST_LIMIT, DEFAULT_TIMEOUT};
pub use documents::{DocumentCommentRepository, DocumentPostRepository};
pub use functions::HttpFunctionInvoker;
pub use storage::BucketObjectStore;
