//! Ingestion input and result types

use std::fmt;
use std::io::Cursor;
use tokio::io::AsyncRead;

/// Byte stream carrying one item's content.
pub type UploadContent = Box<dyn AsyncRead + Send + Unpin>;

/// One named byte stream submitted for storage.
pub struct UploadItem {
    /// Client-supplied file name. Untrusted.
    pub name: String,
    /// Declared size in bytes. Items declaring zero bytes are skipped.
    pub size: u64,
    pub content: UploadContent,
}

impl UploadItem {
    pub fn new(
        name: impl Into<String>,
        size: u64,
        content: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            content: Box::new(content),
        }
    }

    /// Builds an item from content that is already in memory.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let size = bytes.len() as u64;
        Self::new(name, size, Cursor::new(bytes))
    }
}

impl fmt::Debug for UploadItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadItem")
            .field("name", &self.name)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// What happened to a single item that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Written under the given sanitized name.
    Stored(String),
    /// Declared empty, so never written.
    Skipped,
}

/// Aggregate outcome of one ingestion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionResult {
    /// Sanitized names written by this call, in input order.
    pub stored_names: Vec<String>,
    /// Short, user-facing summary.
    pub message: String,
    pub success: bool,
}
