//! # Scribe Core
//!
//! The content layer of the Scribe blog.
//! Domain types, the ports the backend adapters implement, and the services
//! (listing cache, author resolver, comments, media) that sit between UI views
//! and the remote store. No transport dependencies live here.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{DomainError, RepoError, ResolveError};
