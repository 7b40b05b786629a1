//! Storage root
//!
//! The single authoritative view of the directory uploads are written to.

use log::{debug, error, info};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::StorageError;
use crate::storage::validation::sanitize_file_name;

/// A client file name resolved to a location inside the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Sanitized base name, used as the on-disk key.
    pub name: String,
    pub path: PathBuf,
}

/// Directory under which every uploaded file is stored.
///
/// The path is fixed at construction and made absolute; all paths handed out
/// by [`StorageRoot::resolve_path`] are direct children of it.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    root_path: PathBuf,
}

impl StorageRoot {
    /// Creates a storage root for the configured path.
    ///
    /// Fails with `StorageUnavailable` if the path is empty. Nothing is
    /// created on disk until [`StorageRoot::ensure_exists`] is called.
    pub fn new(root_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root_path = root_path.as_ref();
        if root_path.as_os_str().is_empty() {
            return Err(StorageError::StorageUnavailable(
                "storage root is not configured".into(),
            ));
        }

        let root_path = std::path::absolute(root_path).map_err(|e| {
            StorageError::StorageUnavailable(format!("{}: {}", root_path.display(), e))
        })?;

        Ok(Self { root_path })
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Creates the root directory (and missing parents) if it is absent.
    ///
    /// Idempotent: an existing directory is left untouched.
    pub async fn ensure_exists(&self) -> Result<(), StorageError> {
        match fs::metadata(&self.root_path).await {
            Ok(metadata) if metadata.is_dir() => return Ok(()),
            Ok(_) => {
                error!(
                    "Storage root {} exists but is not a directory",
                    self.root_path.display()
                );
                return Err(StorageError::StorageUnavailable(format!(
                    "{} is not a directory",
                    self.root_path.display()
                )));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(self.unavailable(e)),
        }

        fs::create_dir_all(&self.root_path)
            .await
            .map_err(|e| self.unavailable(e))?;

        info!("Created storage root {}", self.root_path.display());
        Ok(())
    }

    /// Resolves an untrusted client name to a path directly under the root.
    pub fn resolve_path(&self, name: &str) -> Result<ResolvedPath, StorageError> {
        let base = sanitize_file_name(name)
            .ok_or_else(|| StorageError::InvalidName(name.to_string()))?;

        let path = self.root_path.join(base);

        // Must be a strict child of the root, never the root or above it
        if path.parent() != Some(self.root_path.as_path()) {
            return Err(StorageError::InvalidName(name.to_string()));
        }

        debug!("Resolved {:?} to {}", name, path.display());

        Ok(ResolvedPath {
            name: base.to_string(),
            path,
        })
    }

    /// Lists the base names of regular files directly under the root.
    ///
    /// Entries come back in directory enumeration order, which is not stable
    /// across platforms.
    pub async fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut entries = fs::read_dir(&self.root_path)
            .await
            .map_err(|e| self.unavailable(e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| self.unavailable(e))? {
            let file_type = entry.file_type().await.map_err(|e| self.unavailable(e))?;
            if file_type.is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }

        debug!(
            "Listed storage root {} - {} files",
            self.root_path.display(),
            names.len()
        );

        Ok(names)
    }

    fn unavailable(&self, e: std::io::Error) -> StorageError {
        error!("Storage root {} unavailable: {}", self.root_path.display(), e);
        StorageError::StorageUnavailable(format!("{}: {}", self.root_path.display(), e))
    }
}
