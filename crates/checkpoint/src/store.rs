//! Task-state storage trait and types
//!
//! This module defines the TaskStateStore trait for backend-agnostic
//! marker storage operations, plus shared types.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of one generator task.
///
/// Two runs with the same identity are considered the same task, so the
/// second run resumes instead of starting for the first time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskIdentity {
    /// Connector (deployment) name
    pub connector: String,
    /// Task name within the connector
    pub task: String,
}

impl TaskIdentity {
    pub fn new(connector: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            connector: connector.into(),
            task: task.into(),
        }
    }

    /// Filesystem- and key-safe rendering, e.g. `datagen-0`.
    ///
    /// Distinct identities always render differently: ASCII letters and
    /// digits are kept, every other byte becomes `_` plus two hex digits,
    /// and `-` only ever separates the connector from the task.
    pub fn as_key(&self) -> String {
        format!(
            "{}-{}",
            encode_key_component(&self.connector),
            encode_key_component(&self.task)
        )
    }
}

fn encode_key_component(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        if byte.is_ascii_alphanumeric() {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("_{byte:02x}"));
        }
    }
    encoded
}

impl std::fmt::Display for TaskIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.connector, self.task)
    }
}

/// Marker data stored in backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMarker {
    /// Task the marker belongs to
    pub identity: TaskIdentity,
    /// Timestamp when the marker was created
    pub created_at: DateTime<Utc>,
    /// Free-form note, e.g. whether history was generated
    #[serde(default)]
    pub note: String,
}

impl StoredMarker {
    pub fn new(identity: TaskIdentity, note: impl Into<String>) -> Self {
        Self {
            identity,
            created_at: Utc::now(),
            note: note.into(),
        }
    }
}

/// Trait for task-state storage operations.
///
/// This trait abstracts the storage backend, allowing the same first-run
/// logic to work with:
/// - Filesystem storage (`FilesystemStore`)
/// - In-memory storage (`MemoryStore`)
#[async_trait]
pub trait TaskStateStore: Send + Sync {
    /// Store a marker in the storage backend, replacing any previous one.
    async fn store_marker(&self, marker: &StoredMarker) -> Result<()>;

    /// Read the marker of a task from the storage backend.
    ///
    /// Returns None if the task has never stored one.
    async fn read_marker(&self, identity: &TaskIdentity) -> Result<Option<StoredMarker>>;
}
