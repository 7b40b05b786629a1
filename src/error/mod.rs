//! Error handling
//!
//! Defines error types for the ingestion core and the upload server.

pub mod handlers;
pub mod types;

pub use types::*;
