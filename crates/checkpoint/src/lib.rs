//! Task-state markers for event-datagen
//!
//! Provides storage-agnostic persistence of "this task has started before"
//! markers, used to decide whether startup history should be generated.
//!
//! # Architecture
//!
//! This crate provides a small marker system that:
//! - Identifies a generator task via `TaskIdentity`
//! - Persists a `StoredMarker` the first time a task identity starts
//! - Supports multiple storage backends via the `TaskStateStore` trait
//!
//! ## Storage Backends
//!
//! - `FilesystemStore` - Stores markers as JSON files
//! - `MemoryStore` - Keeps markers in process memory (tests, ephemeral runs)

mod filesystem;
mod memory;
pub mod store;

#[cfg(test)]
mod tests;

// Re-export store trait and types
pub use store::{StoredMarker, TaskIdentity, TaskStateStore};

// Re-export storage implementations
pub use filesystem::FilesystemStore;
pub use memory::MemoryStore;
