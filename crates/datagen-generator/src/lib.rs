//! Event producers for the event-datagen framework.
//!
//! This crate provides the [`Producer`] contract consumed by the scheduling
//! and backfill engine, plus the concrete producers for each event kind.
//! Producers are told what time it is instead of reading the wall clock, so
//! the same instance can replay history with a simulated clock and then
//! carry on with live traffic.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────────┐
//!   at: DateTime ─▶  Producer::produce   │──▶ Vec<Event>
//!                 │                      │
//!                 │  - own StdRng        │
//!                 │  - own entity state  │
//!                 └──────────────────────┘
//! ```
//!
//! # Producers
//!
//! - `NewCustomerProducer` - Registrations, each followed by a first order
//! - `OrderProducer` - Orders, recorded into a shared [`RecentOrders`] pool
//! - `CancellationProducer` - Cancels an order taken from the pool
//! - `OrderPatternProducer` - Large orders cancelled soon after, optionally
//!   followed by a small reorder of the same product
//! - `StockMovementProducer` - Stock in and out of the warehouses
//! - `BadgeInProducer` - Employees badging in at warehouse doors
//! - `SensorReadingProducer` - IoT temperature/humidity readings, normal or high
//! - `OnlineOrderProducer` - Multi-product orders, some hitting an out-of-stock item
//! - `ReturnRequestProducer` - Returns, mostly for the fit on products with a size issue
//! - `ProductReviewProducer` - Reviews, skewed for products with a size issue
//! - `TransactionProducer` - Multi-step transactions (`STARTED` → `PROCESSING`
//!   → `PROCESSING` → `COMPLETED`), some of which are abandoned

pub mod domain;
pub mod generators;
pub mod producer;

// Re-exports for convenience
pub use domain::badge::BadgeInProducer;
pub use domain::customer::{Customer, NewCustomerProducer};
pub use domain::followup::FollowUps;
pub use domain::online::{OnlineOrderProducer, OnlineOrderSettings};
pub use domain::order::{CancellationProducer, OrderProducer, OrderSettings, RecentOrders};
pub use domain::order_pattern::{OrderPattern, OrderPatternProducer, OrderPatternSettings};
pub use domain::product::{Product, ProductCatalog};
pub use domain::returns::ReturnRequestProducer;
pub use domain::review::{ProductReviewProducer, ReviewSettings};
pub use domain::sensor::SensorReadingProducer;
pub use domain::stock::StockMovementProducer;
pub use domain::transaction::{
    TransactionProducer, TransactionRecord, TransactionSettings, TransactionState,
    TransactionStats,
};
pub use generators::seeded_rng;
pub use producer::{GeneratorError, Producer};
