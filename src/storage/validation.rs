//! Name validation
//!
//! Reduces untrusted client file names to a safe base name.

/// Reduce a client-supplied name to its base name.
///
/// Both `/` and `\` count as separators so that paths coming from any client
/// platform collapse to the final segment. Control characters are refused so
/// a name can never break a reply or listing line. Returns `None` when nothing usable
/// is left.
pub fn sanitize_file_name(name: &str) -> Option<&str> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");

    if base.is_empty() || base == "." || base == ".." || base.chars().any(char::is_control) {
        None
    } else {
        Some(base)
    }
}
