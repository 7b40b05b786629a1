//! Bounded line reading
//!
//! Reads command and item header lines without letting a client make the
//! server buffer more than the configured line length.

use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Outcome of reading one protocol line.
#[derive(Debug, PartialEq)]
pub enum LineRead {
    /// Line content with its `\n` or `\r\n` terminator removed.
    Line(String),
    /// Content longer than the limit. `terminated` is false when the rest
    /// of the line is still unread.
    TooLong { terminated: bool },
    Eof,
}

/// Reads one line whose content (terminator excluded) may be at most
/// `limit` bytes. At most `limit + 2` bytes are consumed.
pub async fn read_line_limited<R>(reader: &mut R, limit: usize) -> io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = (&mut *reader)
        .take(limit as u64 + 2)
        .read_until(b'\n', &mut buf)
        .await?;

    if n == 0 {
        return Ok(LineRead::Eof);
    }

    let terminated = buf.last() == Some(&b'\n');
    if terminated {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }

    if buf.len() > limit {
        return Ok(LineRead::TooLong { terminated });
    }

    Ok(LineRead::Line(String::from_utf8_lossy(&buf).into_owned()))
}

/// Skips the remainder of the current line, one buffer at a time.
pub async fn discard_line<R>(reader: &mut R) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let (consumed, done) = {
            let buf = reader.fill_buf().await?;
            if buf.is_empty() {
                return Ok(());
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(pos) => (pos + 1, true),
                None => (buf.len(), false),
            }
        };

        reader.consume(consumed);
        if done {
            return Ok(());
        }
    }
}
