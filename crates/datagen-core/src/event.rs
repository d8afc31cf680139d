//! The immutable event record.

use crate::schema::{EventSchema, SchemaError};
use crate::values::FieldValue;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// One emitted domain occurrence.
///
/// Events are validated against their schema when created and expose no
/// mutators afterwards. They are either delivered to the consumer or
/// discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    partition: String,
    key: String,
    schema: Arc<EventSchema>,
    payload: Vec<(String, FieldValue)>,
    recorded_at: DateTime<Utc>,
}

impl Event {
    /// Create a new event, checking the payload against the schema.
    ///
    /// # Arguments
    /// * `partition` - Logical stream the event belongs to (e.g. `"transaction"`)
    /// * `key` - Record key: unique event id, or entity id for correlated events
    /// * `schema` - Shared schema of the event kind
    /// * `payload` - Named field values in schema order
    /// * `recorded_at` - Wall-clock or backdated time the event was generated
    pub fn new(
        partition: impl Into<String>,
        key: impl Into<String>,
        schema: Arc<EventSchema>,
        payload: Vec<(String, FieldValue)>,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, SchemaError> {
        schema.validate(&payload)?;
        Ok(Self {
            partition: partition.into(),
            key: key.into(),
            schema,
            payload,
            recorded_at,
        })
    }

    pub fn partition(&self) -> &str {
        &self.partition
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn schema(&self) -> &EventSchema {
        &self.schema
    }

    pub fn payload(&self) -> &[(String, FieldValue)] {
        &self.payload
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Get a payload field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.payload
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Render the event as a JSON document.
    ///
    /// ```json
    /// {
    ///     "partition": "transaction",
    ///     "key": "6f1c...",
    ///     "recorded_at": "2024-01-01T00:00:00Z",
    ///     "value": { "id": "6f1c...", "state": "STARTED", ... }
    /// }
    /// ```
    pub fn to_json(&self) -> serde_json::Value {
        let value: serde_json::Map<String, serde_json::Value> = self
            .payload
            .iter()
            .map(|(name, value)| {
                (
                    name.clone(),
                    serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
                )
            })
            .collect();

        serde_json::json!({
            "partition": self.partition,
            "key": self.key,
            "recorded_at": self.recorded_at.to_rfc3339(),
            "value": value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::FieldType;

    fn schema() -> Arc<EventSchema> {
        Arc::new(
            EventSchema::builder("transaction")
                .field("id", FieldType::String)
                .field("amount", FieldType::Float64)
                .build(),
        )
    }

    #[test]
    fn test_new_event() {
        let now = Utc::now();
        let event = Event::new(
            "transaction",
            "t-1",
            schema(),
            vec![
                ("id".to_string(), FieldValue::from("t-1")),
                ("amount".to_string(), FieldValue::from(12.5)),
            ],
            now,
        )
        .unwrap();

        assert_eq!(event.partition(), "transaction");
        assert_eq!(event.key(), "t-1");
        assert_eq!(event.recorded_at(), now);
        assert_eq!(event.schema().name, "transaction");
        assert_eq!(event.get_field("amount"), Some(&FieldValue::Float64(12.5)));
        assert_eq!(event.get_field("state"), None);
    }

    #[test]
    fn test_invalid_payload_rejected() {
        let result = Event::new(
            "transaction",
            "t-1",
            schema(),
            vec![("id".to_string(), FieldValue::from("t-1"))],
            Utc::now(),
        );
        assert!(matches!(result, Err(SchemaError::MissingField { .. })));
    }

    #[test]
    fn test_to_json() {
        let event = Event::new(
            "transaction",
            "t-9",
            schema(),
            vec![
                ("id".to_string(), FieldValue::from("t-9")),
                ("amount".to_string(), FieldValue::from(3.25)),
            ],
            Utc::now(),
        )
        .unwrap();

        let json = event.to_json();
        assert_eq!(json["partition"], "transaction");
        assert_eq!(json["key"], "t-9");
        assert_eq!(json["value"]["id"], "t-9");
        assert_eq!(json["value"]["amount"], 3.25);
        assert!(json["recorded_at"].is_string());
    }
}
