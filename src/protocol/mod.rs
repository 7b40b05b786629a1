//! Upload protocol implementation
//!
//! Handles command parsing, reply formatting, and command handlers.

pub mod commands;
pub mod handlers;
pub mod reader;
pub mod responses;

pub use commands::{Command, CommandData, CommandResult, CommandStatus, parse_command};
pub use handlers::handle_command;
pub use reader::{LineRead, discard_line, read_line_limited};
