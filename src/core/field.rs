//! Field value types shared by every record flowing through the query pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A polymorphic field value that can hold different types
///
/// Every attribute a filter, sort key or aggregate reads from a record is
/// surfaced as a `FieldValue`, so the pipeline never has to guess at the
/// shape of an entity.
///
/// Deserialization goes through [`FieldValue::from_json`], so timestamps
/// arriving as RFC 3339 strings come back as `DateTime`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float; integers widen
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get the value as a timestamp if possible
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Check if the value is an integer or a float
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldValue::Integer(_) | FieldValue::Float(_))
    }

    /// Canonical text form used by search, sorting and CSV rendering
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::String(s) => s.clone(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Boolean(b) => b.to_string(),
            FieldValue::DateTime(dt) => dt.to_rfc3339(),
            FieldValue::Null => String::new(),
        }
    }

    /// Convert a loosely-typed JSON attribute into a field value
    ///
    /// Strings that parse as RFC 3339 timestamps become `DateTime` so that
    /// date-window filters and trend buckets work on untyped payloads.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => match DateTime::parse_from_rfc3339(s) {
                Ok(dt) => FieldValue::DateTime(dt.with_timezone(&Utc)),
                Err(_) => FieldValue::String(s.clone()),
            },
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => n.as_f64().map(FieldValue::Float).unwrap_or(FieldValue::Null),
            },
            Value::Bool(b) => FieldValue::Boolean(*b),
            _ => FieldValue::Null,
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(|value| FieldValue::from_json(&value))
    }
}

/// Conversion into a [`FieldValue`], implemented for the types entity structs use
pub trait ToFieldValue {
    fn to_field_value(&self) -> FieldValue;
}

impl ToFieldValue for String {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::String(self.clone())
    }
}

impl ToFieldValue for &str {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::String((*self).to_string())
    }
}

impl ToFieldValue for i64 {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Integer(*self)
    }
}

impl ToFieldValue for i32 {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Integer(i64::from(*self))
    }
}

impl ToFieldValue for u32 {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Integer(i64::from(*self))
    }
}

impl ToFieldValue for f64 {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Float(*self)
    }
}

impl ToFieldValue for bool {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Boolean(*self)
    }
}

impl ToFieldValue for DateTime<Utc> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::DateTime(*self)
    }
}

impl<T: ToFieldValue> ToFieldValue for Option<T> {
    fn to_field_value(&self) -> FieldValue {
        match self {
            Some(v) => v.to_field_value(),
            None => FieldValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_field_value_string() {
        let value = FieldValue::String("active".to_string());
        assert_eq!(value.as_string(), Some("active"));
        assert_eq!(value.as_integer(), None);
        assert!(!value.is_null());
        assert!(!value.is_numeric());
    }

    #[test]
    fn test_integer_widens_to_f64() {
        let value = FieldValue::Integer(42);
        assert_eq!(value.as_f64(), Some(42.0));
        assert!(value.is_numeric());
    }

    #[test]
    fn test_null_text_is_empty() {
        assert_eq!(FieldValue::Null.to_text(), "");
        assert!(FieldValue::Null.is_null());
    }

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(FieldValue::from_json(&json!(40)), FieldValue::Integer(40));
        assert_eq!(FieldValue::from_json(&json!(12.5)), FieldValue::Float(12.5));
    }

    #[test]
    fn test_from_json_rfc3339_becomes_datetime() {
        let value = FieldValue::from_json(&json!("2026-03-01T08:30:00Z"));
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).unwrap();
        assert_eq!(value.as_datetime(), Some(expected));
    }

    #[test]
    fn test_from_json_plain_string_and_null() {
        assert_eq!(
            FieldValue::from_json(&json!("KA-01-1234")),
            FieldValue::String("KA-01-1234".to_string())
        );
        assert!(FieldValue::from_json(&json!(null)).is_null());
        assert!(FieldValue::from_json(&json!(["a"])).is_null());
    }

    #[test]
    fn test_option_to_field_value() {
        let none: Option<String> = None;
        assert!(none.to_field_value().is_null());
        assert_eq!(Some(3_i32).to_field_value(), FieldValue::Integer(3));
    }

    #[test]
    fn test_serde_roundtrip_mixed() {
        let original = vec![
            FieldValue::String("bus".to_string()),
            FieldValue::Integer(7),
            FieldValue::Boolean(true),
            FieldValue::Null,
        ];
        let json = serde_json::to_string(&original).expect("serialize should succeed");
        let restored: Vec<FieldValue> =
            serde_json::from_str(&json).expect("deserialize should succeed");
        assert_eq!(original, restored);
    }

    #[test]
    fn test_deserialize_parses_timestamps() {
        let restored: FieldValue = serde_json::from_str("\"2026-05-20T08:00:00Z\"").unwrap();
        let expected = Utc.with_ymd_and_hms(2026, 5, 20, 8, 0, 0).unwrap();
        assert_eq!(restored, FieldValue::DateTime(expected));

        let json = serde_json::to_string(&restored).unwrap();
        let again: FieldValue = serde_json::from_str(&json).unwrap();
        assert_eq!(again, restored);
    }
}
