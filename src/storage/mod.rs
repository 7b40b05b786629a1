//! Storage root management
//!
//! Handles the storage directory, file listing, and name validation.

pub mod root;
pub mod validation;

pub use root::{ResolvedPath, StorageRoot};
pub use validation::sanitize_file_name;
