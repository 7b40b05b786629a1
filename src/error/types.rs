//! Error types
//!
//! Defines the storage-level errors raised by the ingestion core and the
//! outer server errors raised by the transport.

use std::fmt;
use std::io;

/// Storage module errors
#[derive(Debug)]
pub enum StorageError {
    /// The storage root is unset, cannot be created, or cannot be read.
    StorageUnavailable(String),
    /// A client-supplied name sanitizes to nothing or escapes the root.
    InvalidName(String),
    /// Streaming content to the destination file failed.
    WriteFailure(String, io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::StorageUnavailable(reason) => {
                write!(f, "Storage unavailable: {}", reason)
            }
            StorageError::InvalidName(name) => write!(f, "Invalid file name: {:?}", name),
            StorageError::WriteFailure(name, e) => {
                write!(f, "Failed to write {}: {}", name, e)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::WriteFailure(_, e) => Some(e),
            _ => None,
        }
    }
}

/// Errors surfaced by the server and client sessions
#[derive(Debug)]
pub enum ServerError {
    Storage(StorageError),
    Config(config::ConfigError),
    IoError(io::Error),
    ProtocolError(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Storage(e) => write!(f, "Storage error: {}", e),
            ServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ServerError::IoError(e) => write!(f, "I/O error: {}", e),
            ServerError::ProtocolError(e) => write!(f, "Protocol error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<StorageError> for ServerError {
    fn from(error: StorageError) -> Self {
        ServerError::Storage(error)
    }
}

impl From<config::ConfigError> for ServerError {
    fn from(error: config::ConfigError) -> Self {
        ServerError::Config(error)
    }
}

impl From<io::Error> for ServerError {
    fn from(error: io::Error) -> Self {
        ServerError::IoError(error)
    }
}
