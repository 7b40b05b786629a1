//! Error handlers
//!
//! Logs server errors and maps them to protocol reply codes.

use crate::error::types::{ServerError, StorageError};
use crate::protocol::responses;
use log::error;

/// Handle a server error
pub fn handle_error(err: &ServerError) {
    error!("Upload server error: {}", err);
}

/// Convert error to a protocol reply code
pub fn error_to_reply_code(err: &ServerError) -> u16 {
    match err {
        ServerError::Storage(StorageError::InvalidName(_)) => responses::SYNTAX_ERROR,
        ServerError::Storage(_) => responses::ACTION_ABORTED,
        ServerError::Config(_) => responses::SERVICE_UNAVAILABLE,
        ServerError::IoError(_) => responses::SERVICE_UNAVAILABLE,
        ServerError::ProtocolError(_) => responses::SYNTAX_ERROR,
    }
}
