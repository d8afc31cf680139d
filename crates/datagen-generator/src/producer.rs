//! The producer contract.

use chrono::{DateTime, Utc};
use datagen_core::{Event, SchemaError};

/// Error type for a single producer firing.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Related entity data is not available yet, or is busy
    #[error("No eligible entity: {0}")]
    NoEligibleEntity(String),

    /// The event payload could not be built
    #[error("Payload error: {0}")]
    Payload(#[from] SchemaError),

    /// Producer settings are unusable
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GeneratorError {
    /// Whether the firing can simply be retried at the next cadence.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NoEligibleEntity(_))
    }
}

/// A source of events for one job.
///
/// A producer is owned by exactly one job, so `produce` is never called
/// concurrently on the same instance. It may be called concurrently with
/// other producers.
pub trait Producer: Send {
    /// Name of the job this producer feeds, used in logs.
    fn name(&self) -> &str;

    /// Produce the events for one firing at time `at`.
    ///
    /// Returns zero or more events; an error skips this firing only.
    fn produce(&mut self, at: DateTime<Utc>) -> Result<Vec<Event>, GeneratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(GeneratorError::NoEligibleEntity("no orders".into()).is_transient());
        assert!(!GeneratorError::Config("bad".into()).is_transient());
        let payload = GeneratorError::from(SchemaError::MissingField {
            schema: "order".into(),
            field: "id".into(),
        });
        assert!(!payload.is_transient());
        assert!(payload.to_string().starts_with("Payload error"));
    }
}
