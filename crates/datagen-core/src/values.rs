//! Value representations for event payloads.
//!
//! Every field of an event payload carries a [`FieldValue`] whose variant
//! must agree with the [`FieldType`] declared by the event schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Declared type of a payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Int64,
    /// 64-bit floating point
    Float64,
    /// Boolean
    Bool,
    /// Date/time in UTC
    Timestamp,
}

impl FieldType {
    /// Get the string representation of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int64 => "int64",
            FieldType::Float64 => "float64",
            FieldType::Bool => "bool",
            FieldType::Timestamp => "timestamp",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single payload value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// String value
    String(String),

    /// 64-bit signed integer
    Int64(i64),

    /// 64-bit floating point
    Float64(f64),

    /// Boolean value
    Bool(bool),

    /// Date/time with timezone
    Timestamp(DateTime<Utc>),

    /// Null value, only accepted for optional fields
    Null,
}

impl FieldValue {
    /// The declared type this value satisfies, or `None` for null.
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            Self::String(_) => Some(FieldType::String),
            Self::Int64(_) => Some(FieldType::Int64),
            Self::Float64(_) => Some(FieldType::Float64),
            Self::Bool(_) => Some(FieldType::Bool),
            Self::Timestamp(_) => Some(FieldType::Timestamp),
            Self::Null => None,
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as a timestamp.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Int64(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        Self::Float64(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Timestamp(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_of_value() {
        assert_eq!(FieldValue::from("x").field_type(), Some(FieldType::String));
        assert_eq!(FieldValue::from(3i64).field_type(), Some(FieldType::Int64));
        assert_eq!(FieldValue::from(1.5).field_type(), Some(FieldType::Float64));
        assert_eq!(FieldValue::from(true).field_type(), Some(FieldType::Bool));
        assert_eq!(
            FieldValue::from(Utc::now()).field_type(),
            Some(FieldType::Timestamp)
        );
        assert_eq!(FieldValue::Null.field_type(), None);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(FieldValue::from("abc").as_str(), Some("abc"));
        assert_eq!(FieldValue::from(7i64).as_i64(), Some(7));
        assert_eq!(FieldValue::from(7i64).as_f64(), None);
        assert!(FieldValue::Null.is_null());
    }

    #[test]
    fn test_untagged_json() {
        let json = serde_json::to_string(&FieldValue::from(42i64)).unwrap();
        assert_eq!(json, "42");
        let json = serde_json::to_string(&FieldValue::from("STARTED")).unwrap();
        assert_eq!(json, "\"STARTED\"");
        let json = serde_json::to_string(&FieldValue::Null).unwrap();
        assert_eq!(json, "null");
    }
}
