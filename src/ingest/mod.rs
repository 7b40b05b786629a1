//! Ingestion module
//!
//! Turns a batch of named byte streams into stored files and an aggregate
//! result for the caller.

pub mod results;
pub mod service;

pub use results::{IngestionResult, ItemOutcome, UploadContent, UploadItem};
pub use service::{IngestionService, NO_FILES_MESSAGE, UPLOAD_ERROR_MESSAGE};
