//! Reply codes
//!
//! Numeric reply codes and reply formatting.

pub const OPENING: u16 = 150;
pub const OK: u16 = 200;
pub const GOODBYE: u16 = 221;
pub const READY: u16 = 220;
pub const ACTION_COMPLETE: u16 = 226;
pub const FILE_STORED: u16 = 250;
pub const SERVICE_UNAVAILABLE: u16 = 421;
pub const ACTION_ABORTED: u16 = 451;
pub const UNKNOWN_COMMAND: u16 = 500;
pub const SYNTAX_ERROR: u16 = 501;

/// Format a reply line
pub fn format_response(code: u16, message: &str) -> String {
    format!("{} {}\r\n", code, message)
}
