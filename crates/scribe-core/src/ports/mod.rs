//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" the backend adapters must implement.

mod cache;
mod clock;
mod functions;
mod object_store;
mod repository;

pub use cache::{Cache, CacheError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use functions::FunctionInvoker;
pub use object_store::ObjectStore;
pub use repository::{CommentRepository, PostRepository};
