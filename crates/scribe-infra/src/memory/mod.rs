//! In-memory backend, used when no remote backend is configured.
//! Everything is lost on restart.

mod documents;
mod functions;
mod storage;

pub use documents::{InMemoryCommentRepository, InMemoryPostRepository};
pub use functions::InMemoryUserDirectory;
pub use storage::InMemoryObjectStore;
