//! Core event types for the event-datagen framework.
//!
//! This crate provides the foundational types shared by the generators and
//! the delivery engine:
//!
//! - [`FieldType`] / [`FieldValue`] - Typed payload values
//! - [`EventSchema`] - The fixed field layout of one event kind
//! - [`Event`] - An immutable, validated record ready for delivery
//!
//! # Architecture
//!
//! ```text
//! datagen-core (this crate)
//!    │
//!    ├─── datagen-generator  (builds Events from producers)
//!    │
//!    └─── event-datagen      (queues, schedules and delivers Events)
//! ```
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use datagen_core::{Event, EventSchema, FieldType, FieldValue};
//! use std::sync::Arc;
//!
//! let schema = Arc::new(
//!     EventSchema::builder("sensor_reading")
//!         .version(1)
//!         .field("sensor", FieldType::String)
//!         .field("temperature", FieldType::Float64)
//!         .build(),
//! );
//!
//! let event = Event::new(
//!     "sensor_reading",
//!     "reading-1",
//!     schema,
//!     vec![
//!         ("sensor".to_string(), FieldValue::from("S-001")),
//!         ("temperature".to_string(), FieldValue::Float64(21.5)),
//!     ],
//!     Utc::now(),
//! )
//! .unwrap();
//!
//! assert_eq!(event.key(), "reading-1");
//! ```

pub mod event;
pub mod schema;
pub mod values;

// Re-exports for convenience
pub use event::Event;
pub use schema::{EventSchema, EventSchemaBuilder, FieldSchema, SchemaError};
pub use values::{FieldType, FieldValue};
