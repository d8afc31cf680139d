//! Event schema definitions.
//!
//! A schema belongs to an event kind, not to an event instance: every event of
//! a kind shares one `Arc<EventSchema>` and is validated against it on creation.

use crate::values::{FieldType, FieldValue};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Errors raised when a payload does not match its schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// A required field was not supplied
    #[error("Field '{field}' is required by schema '{schema}'")]
    MissingField { schema: String, field: String },

    /// A field was supplied that the schema does not declare
    #[error("Field '{field}' is not declared by schema '{schema}'")]
    UnknownField { schema: String, field: String },

    /// A field was supplied more than once
    #[error("Field '{field}' appears more than once in a '{schema}' payload")]
    DuplicateField { schema: String, field: String },

    /// A value does not match the declared field type
    #[error("Field '{field}' of schema '{schema}' expects {expected}, got {actual}")]
    TypeMismatch {
        schema: String,
        field: String,
        expected: FieldType,
        actual: String,
    },
}

/// One declared field of an event schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Field name
    pub name: String,
    /// Declared type
    pub field_type: FieldType,
    /// Whether the field may be null or omitted
    #[serde(default)]
    pub optional: bool,
}

/// The fixed field layout of one event kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSchema {
    /// Schema name, usually the same as the partition key of its events
    pub name: String,
    /// Schema version
    pub version: u32,
    /// Declared fields in payload order
    pub fields: Vec<FieldSchema>,
}

impl EventSchema {
    /// Start building a schema with the given name.
    pub fn builder(name: impl Into<String>) -> EventSchemaBuilder {
        EventSchemaBuilder {
            schema: EventSchema {
                name: name.into(),
                version: 1,
                fields: Vec::new(),
            },
        }
    }

    /// Look up a declared field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get all field names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Check a payload against this schema.
    pub fn validate(&self, payload: &[(String, FieldValue)]) -> Result<(), SchemaError> {
        let mut seen = HashSet::with_capacity(payload.len());

        for (name, value) in payload {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    schema: self.name.clone(),
                    field: name.clone(),
                });
            }

            let field = self
                .get_field(name)
                .ok_or_else(|| SchemaError::UnknownField {
                    schema: self.name.clone(),
                    field: name.clone(),
                })?;

            match value.field_type() {
                Some(actual) if actual == field.field_type => {}
                None if field.optional => {}
                actual => {
                    return Err(SchemaError::TypeMismatch {
                        schema: self.name.clone(),
                        field: name.clone(),
                        expected: field.field_type,
                        actual: actual.map_or("null", |t| t.as_str()).to_string(),
                    })
                }
            }
        }

        if let Some(missing) = self
            .fields
            .iter()
            .find(|f| !f.optional && !seen.contains(f.name.as_str()))
        {
            return Err(SchemaError::MissingField {
                schema: self.name.clone(),
                field: missing.name.clone(),
            });
        }

        Ok(())
    }
}

/// Builder for [`EventSchema`].
#[derive(Debug, Clone)]
pub struct EventSchemaBuilder {
    schema: EventSchema,
}

impl EventSchemaBuilder {
    /// Set the schema version.
    pub fn version(mut self, version: u32) -> Self {
        self.schema.version = version;
        self
    }

    /// Add a required field.
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.schema.fields.push(FieldSchema {
            name: name.into(),
            field_type,
            optional: false,
        });
        self
    }

    /// Add an optional field.
    pub fn optional_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.schema.fields.push(FieldSchema {
            name: name.into(),
            field_type,
            optional: true,
        });
        self
    }

    pub fn build(self) -> EventSchema {
        self.schema
    }
}
