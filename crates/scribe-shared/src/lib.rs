//! # Scribe Shared
//!
//! Request and response types exchanged between UI views and the gateway.
//! Kept free of server dependencies so a browser client can compile it too.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
