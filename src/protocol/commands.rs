//! Module `commands`
//!
//! Defines the command set understood by the upload server, the parsing of
//! command lines and item headers, and the result type handlers return.

/// A command parsed from a client line.
///
/// Commands that take arguments carry them already parsed.
#[derive(Debug, PartialEq)]
pub enum Command {
    QUIT,
    LIST,
    NOOP,
    UPLD(String), // Upload batch; raw item count, validated by the handler
    UNKNOWN,
}

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Additional data associated with a command result.
#[derive(Debug, PartialEq)]
pub enum CommandData {
    /// An upload batch ran and stored this many files.
    BatchStored(usize),
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
    pub data: Option<CommandData>,
}

/// Parses a raw command line into a `Command`.
///
/// Returns `UNKNOWN` if a known command is missing its argument.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_ascii_uppercase();
    let arg = parts.next().unwrap_or("").trim();

    match cmd.as_str() {
        "QUIT" | "Q" => Command::QUIT,
        "LIST" => Command::LIST,
        "NOOP" => Command::NOOP,
        "UPLD" if !arg.is_empty() => Command::UPLD(arg.to_string()),
        _ => Command::UNKNOWN,
    }
}

/// Header announcing one item of an upload batch: `<size> <name>`.
#[derive(Debug, PartialEq)]
pub struct ItemHeader {
    pub size: u64,
    pub name: String,
}

/// Parses an item header line. The name is everything after the first
/// space, so it may itself contain spaces.
pub fn parse_item_header(raw: &str) -> Option<ItemHeader> {
    let line = raw.trim_end_matches(['\r', '\n']);
    let (size, name) = line.split_once(' ')?;
    let size = size.parse::<u64>().ok()?;

    Some(ItemHeader {
        size,
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(parse_command("LIST\r\n"), Command::LIST);
        assert_eq!(parse_command("list"), Command::LIST);
        assert_eq!(parse_command("QUIT"), Command::QUIT);
        assert_eq!(parse_command("noop"), Command::NOOP);
        assert_eq!(parse_command("UPLD 3"), Command::UPLD("3".into()));
    }

    #[test]
    fn misused_commands_are_unknown() {
        assert_eq!(parse_command("UPLD"), Command::UNKNOWN);
        assert_eq!(parse_command("STOR a.txt"), Command::UNKNOWN);
        assert_eq!(parse_command(""), Command::UNKNOWN);
    }

    #[test]
    fn item_header_keeps_spaces_in_name() {
        assert_eq!(
            parse_item_header("12 my notes.txt\r\n"),
            Some(ItemHeader {
                size: 12,
                name: "my notes.txt".into()
            })
        );
        assert_eq!(
            parse_item_header("0 empty.txt\n"),
            Some(ItemHeader {
                size: 0,
                name: "empty.txt".into()
            })
        );
    }

    #[test]
    fn malformed_item_headers_are_rejected() {
        assert_eq!(parse_item_header("a.txt"), None);
        assert_eq!(parse_item_header("-1 a.txt"), None);
        assert_eq!(parse_item_header("ten a.txt"), None);
    }
}
