//! In-memory marker storage.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::store::{StoredMarker, TaskIdentity, TaskStateStore};

/// In-memory implementation of TaskStateStore trait.
///
/// Markers survive as long as the store instance does, so reusing one
/// instance across task restarts behaves like a persistent backend.
#[derive(Default)]
pub struct MemoryStore {
    markers: Mutex<HashMap<TaskIdentity, StoredMarker>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored markers.
    pub fn len(&self) -> usize {
        self.markers.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TaskStateStore for MemoryStore {
    async fn store_marker(&self, marker: &StoredMarker) -> Result<()> {
        let mut markers = self
            .markers
            .lock()
            .map_err(|_| anyhow::anyhow!("Task marker store lock poisoned"))?;
        markers.insert(marker.identity.clone(), marker.clone());
        Ok(())
    }

    async fn read_marker(&self, identity: &TaskIdentity) -> Result<Option<StoredMarker>> {
        let markers = self
            .markers
            .lock()
            .map_err(|_| anyhow::anyhow!("Task marker store lock poisoned"))?;
        Ok(markers.get(identity).cloned())
    }
}
