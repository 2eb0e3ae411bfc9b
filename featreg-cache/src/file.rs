//! JSON file backing store.
//!
//! The registry is one JSON document on disk. Every read parses the file
//! again, so direct reads always see the latest write.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use featreg_core::{RegistryResult, StoreError};

use crate::snapshot::RegistrySnapshot;
use crate::store::impl_snapshot_backed_store;

/// Registry store backed by a JSON snapshot document.
#[derive(Debug, Clone)]
pub struct JsonFileRegistryStore {
    path: PathBuf,
}

impl JsonFileRegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the document.
    pub async fn document(&self) -> RegistryResult<Arc<RegistrySnapshot>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| StoreError::SnapshotRead {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        let snapshot: RegistrySnapshot =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::MalformedSnapshot {
                reason: e.to_string(),
            })?;
        Ok(Arc::new(snapshot))
    }

    /// Write a document, replacing the file atomically.
    ///
    /// Each write stages into its own temporary file next to the target, so
    /// concurrent writers never rename each other's partial output into place.
    pub async fn write(&self, snapshot: &RegistrySnapshot) -> RegistryResult<()> {
        let write_error = |reason: String| StoreError::SnapshotWrite {
            path: self.path.display().to_string(),
            reason,
        };

        let bytes = serde_json::to_vec_pretty(snapshot).map_err(|e| write_error(e.to_string()))?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || persist_atomically(&path, &bytes))
            .await
            .map_err(|e| write_error(e.to_string()))?
            .map_err(write_error)?;
        Ok(())
    }
}

fn persist_atomically(path: &Path, bytes: &[u8]) -> Result<(), String> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staging = tempfile::NamedTempFile::new_in(dir).map_err(|e| e.to_string())?;
    staging.write_all(bytes).map_err(|e| e.to_string())?;
    staging.as_file().sync_all().map_err(|e| e.to_string())?;
    staging.persist(path).map_err(|e| e.error.to_string())?;
    Ok(())
}

impl_snapshot_backed_store!(JsonFileRegistryStore);
