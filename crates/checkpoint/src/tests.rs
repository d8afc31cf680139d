//! Unit tests for the checkpoint crate.

use tempfile::TempDir;

use crate::{FilesystemStore, MemoryStore, StoredMarker, TaskIdentity, TaskStateStore};

// ============================================================================
// TaskIdentity Tests
// ============================================================================

#[test]
fn test_identity_key_is_path_safe() {
    let identity = TaskIdentity::new("loose hanger/datagen", "0");
    assert_eq!(identity.as_key(), "loose_20hanger_2fdatagen-0");
    assert_eq!(identity.to_string(), "loose hanger/datagen/0");
    assert_eq!(TaskIdentity::new("datagen", "0").as_key(), "datagen-0");
}

#[test]
fn test_identity_keys_are_distinct() {
    let pairs = [
        (TaskIdentity::new("a-b", "c"), TaskIdentity::new("a", "b-c")),
        (TaskIdentity::new("a b", "0"), TaskIdentity::new("a_b", "0")),
        (TaskIdentity::new("a_20b", "0"), TaskIdentity::new("a b", "0")),
        (TaskIdentity::new("", "a-"), TaskIdentity::new("-a", "")),
        (TaskIdentity::new("caf\u{e9}", "0"), TaskIdentity::new("caf_c3_a9", "0")),
    ];
    for (left, right) in pairs {
        assert_ne!(left.as_key(), right.as_key(), "{left} vs {right}");
    }
}

#[test]
fn test_marker_serialization() {
    let marker = StoredMarker::new(TaskIdentity::new("datagen", "1"), "history generated");
    let json = serde_json::to_string(&marker).unwrap();
    let parsed: StoredMarker = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, marker);
}

// ============================================================================
// FilesystemStore Tests
// ============================================================================

#[tokio::test]
async fn test_filesystem_store_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let store = FilesystemStore::new(temp_dir.path().join("state"));
    let identity = TaskIdentity::new("datagen", "0");

    assert!(store.read_marker(&identity).await.unwrap().is_none());

    let marker = StoredMarker::new(identity.clone(), "first start");
    store.store_marker(&marker).await.unwrap();

    let loaded = store.read_marker(&identity).await.unwrap().unwrap();
    assert_eq!(loaded, marker);
    assert!(temp_dir
        .path()
        .join("state")
        .join("task_datagen-0.json")
        .exists());
}

#[tokio::test]
async fn test_filesystem_store_survives_new_instance() {
    let temp_dir = TempDir::new().unwrap();
    let identity = TaskIdentity::new("datagen", "0");

    FilesystemStore::new(temp_dir.path())
        .store_marker(&StoredMarker::new(identity.clone(), ""))
        .await
        .unwrap();

    // A "restarted" process opens the same directory
    let reopened = FilesystemStore::new(temp_dir.path());
    assert!(reopened.read_marker(&identity).await.unwrap().is_some());
    assert!(reopened
        .read_marker(&TaskIdentity::new("datagen", "1"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_filesystem_store_rejects_corrupt_marker() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("task_datagen-0.json"), "not json").unwrap();

    let store = FilesystemStore::new(temp_dir.path());
    let result = store.read_marker(&TaskIdentity::new("datagen", "0")).await;
    assert!(result.is_err());
    assert!(format!("{:#}", result.unwrap_err()).contains("Failed to parse task marker"));
}

#[tokio::test]
async fn test_filesystem_store_keeps_similar_identities_apart() {
    let temp_dir = TempDir::new().unwrap();
    let store = FilesystemStore::new(temp_dir.path());
    let first = TaskIdentity::new("a-b", "c");
    let second = TaskIdentity::new("a", "b-c");

    store
        .store_marker(&StoredMarker::new(first.clone(), ""))
        .await
        .unwrap();
    assert!(store.read_marker(&first).await.unwrap().is_some());
    assert!(store.read_marker(&second).await.unwrap().is_none());
}

#[tokio::test]
async fn test_filesystem_store_rejects_marker_of_other_task() {
    let temp_dir = TempDir::new().unwrap();
    let store = FilesystemStore::new(temp_dir.path());
    let ours = TaskIdentity::new("datagen", "0");

    // a marker written for another task under our file name
    let foreign = StoredMarker::new(TaskIdentity::new("other", "9"), "");
    std::fs::write(
        temp_dir.path().join(format!("task_{}.json", ours.as_key())),
        serde_json::to_string(&foreign).unwrap(),
    )
    .unwrap();

    let err = store.read_marker(&ours).await.unwrap_err();
    assert!(err.to_string().contains("belongs to other/9"));
}

// ============================================================================
// MemoryStore Tests
// ============================================================================

#[tokio::test]
async fn test_memory_store() {
    let store = MemoryStore::new();
    let identity = TaskIdentity::new("datagen", "0");
    assert!(store.is_empty());

    store
        .store_marker(&StoredMarker::new(identity.clone(), ""))
        .await
        .unwrap();
    assert_eq!(store.len(), 1);
    assert!(store.read_marker(&identity).await.unwrap().is_some());
}
