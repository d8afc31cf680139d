//! event-datagen Library
//!
//! A synthetic event generator. Independent producers emit events of several
//! kinds on their own cadences into one queue, which an external consumer
//! drains by polling.
//!
//! # Features
//!
//! - Independent cadences: one scheduled job per event kind
//! - Sequenced entities: transactions move through `STARTED` → `PROCESSING`
//!   → `PROCESSING` → `COMPLETED`, and some are abandoned partway
//! - Startup history: on the first start of a task, a window of past events
//!   is replayed with a simulated clock before live generation begins
//! - Clean shutdown: after `stop` no job appends another event
//!
//! # Crates
//!
//! - `datagen_core` - Event model and schema validation
//! - `datagen_generator` - Producers and primitive value generators
//! - `checkpoint` - Persisted "task has started before" markers
//!
//! # CLI Usage
//!
//! ```bash
//! # Generate events as JSON lines on stdout for one minute
//! event-datagen run --config datagen.toml --duration-secs 60
//!
//! # Print the effective configuration
//! event-datagen show-config --config datagen.toml
//! ```

pub mod config;
pub mod history;
pub mod queue;
pub mod scheduler;
pub mod task;

pub use config::{ConfigError, DatagenConfig};
pub use history::{record_first_start, starting_for_first_time, HistoryGenerator};
pub use queue::{EventQueue, EventSender};
pub use scheduler::{Job, JobError, JobStatsSnapshot, Scheduler};
pub use task::{build_jobs, DatagenTask};
