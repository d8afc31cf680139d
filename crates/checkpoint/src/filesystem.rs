//! Filesystem-based marker storage implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

use crate::store::{StoredMarker, TaskIdentity, TaskStateStore};

/// Filesystem implementation of TaskStateStore trait.
///
/// Stores one JSON file per task identity in a directory:
/// `task_{identity}.json`.
pub struct FilesystemStore {
    dir: PathBuf,
}

impl FilesystemStore {
    /// Create a new FilesystemStore with the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Get the directory path.
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn marker_path(&self, identity: &TaskIdentity) -> PathBuf {
        self.dir.join(format!("task_{}.json", identity.as_key()))
    }
}

#[async_trait]
impl TaskStateStore for FilesystemStore {
    async fn store_marker(&self, marker: &StoredMarker) -> Result<()> {
        std::fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create state directory {}", self.dir.display())
        })?;

        let path = self.marker_path(&marker.identity);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(marker)?)?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to write task marker {}", path.display()))?;

        tracing::info!("Stored task marker to {}", path.display());
        Ok(())
    }

    async fn read_marker(&self, identity: &TaskIdentity) -> Result<Option<StoredMarker>> {
        let path = self.marker_path(identity);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read task marker {}", path.display()))?;
        let marker: StoredMarker = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse task marker {}", path.display()))?;
        if marker.identity != *identity {
            anyhow::bail!(
                "Task marker {} belongs to {}, not {identity}",
                path.display(),
                marker.identity
            );
        }
        Ok(Some(marker))
    }
}
