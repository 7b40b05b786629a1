//! Batch ingestion
//!
//! Writes a batch of uploaded streams into the storage root, one item at a
//! time, stopping at the first failure.

use log::{error, info, warn};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{self, AsyncWriteExt};

use crate::error::StorageError;
use crate::ingest::results::{IngestionResult, ItemOutcome, UploadContent, UploadItem};
use crate::storage::StorageRoot;

pub const NO_FILES_MESSAGE: &str = "Please select at least one file to upload.";
pub const UPLOAD_ERROR_MESSAGE: &str = "An error occurred while uploading files.";

/// Orchestrates batch uploads against a single storage root.
#[derive(Debug, Clone)]
pub struct IngestionService {
    root: StorageRoot,
}

impl IngestionService {
    pub fn new(root: StorageRoot) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &StorageRoot {
        &self.root
    }

    /// Stores every non-empty item, in order, and reports what happened.
    ///
    /// Never fails: errors are logged and folded into an unsuccessful
    /// result. Files written before a failure stay on disk.
    pub async fn ingest(&self, items: Vec<UploadItem>) -> IngestionResult {
        if items.is_empty() {
            return IngestionResult {
                stored_names: Vec::new(),
                message: NO_FILES_MESSAGE.to_string(),
                success: false,
            };
        }

        if let Err(e) = self.root.ensure_exists().await {
            error!("Error uploading files: {}", e);
            return failed(Vec::new());
        }

        let mut stored_names = Vec::with_capacity(items.len());

        for item in items {
            let name = item.name.clone();
            match self.store_item(item).await {
                Ok(ItemOutcome::Stored(stored)) => {
                    info!("File uploaded: {}", stored);
                    stored_names.push(stored);
                }
                Ok(ItemOutcome::Skipped) => {}
                Err(e) => {
                    error!(
                        "Error uploading files: item {:?} failed after {} stored: {}",
                        name,
                        stored_names.len(),
                        e
                    );
                    return failed(stored_names);
                }
            }
        }

        IngestionResult {
            message: format!("Successfully uploaded {} file(s).", stored_names.len()),
            stored_names,
            success: true,
        }
    }

    /// Lists what is currently stored, creating the root if needed.
    pub async fn stored_files(&self) -> Result<Vec<String>, StorageError> {
        self.root.ensure_exists().await?;
        self.root.list().await
    }

    async fn store_item(&self, item: UploadItem) -> Result<ItemOutcome, StorageError> {
        if item.size == 0 {
            return Ok(ItemOutcome::Skipped);
        }

        let resolved = self.root.resolve_path(&item.name)?;

        // Opening a symlink would write through it to wherever it points.
        if let Ok(meta) = tokio::fs::symlink_metadata(&resolved.path).await {
            if meta.file_type().is_symlink() {
                warn!("Refusing to write through symlink {}", resolved.name);
                return Err(StorageError::InvalidName(resolved.name));
            }
        }

        let written = write_stream(&resolved.path, item.content)
            .await
            .map_err(|e| StorageError::WriteFailure(resolved.name.clone(), e))?;

        if written != item.size {
            warn!(
                "File {} declared {} bytes but {} were written",
                resolved.name, item.size, written
            );
        }

        Ok(ItemOutcome::Stored(resolved.name))
    }
}

fn failed(stored_names: Vec<String>) -> IngestionResult {
    IngestionResult {
        stored_names,
        message: UPLOAD_ERROR_MESSAGE.to_string(),
        success: false,
    }
}

/// Copies `content` into `path`, truncating any existing file.
///
/// The file handle lives only inside this function, so it is closed on
/// every return path.
async fn write_stream(path: &Path, mut content: UploadContent) -> io::Result<u64> {
    let mut file = File::create(path).await?;
    let written = io::copy(&mut content, &mut file).await?;
    file.flush().await?;
    Ok(written)
}
