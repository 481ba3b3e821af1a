//! The record abstraction consumed by filters, sorting, paging and aggregation

use crate::core::error::ValidationError;
use crate::core::field::FieldValue;
use crate::core::validation::Validatable;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A domain entity flowing through the list query pipeline.
///
/// Records originate from a backend collaborator and are never mutated by
/// the pipeline: every filter, sort or aggregate produces new derived data.
///
/// The field `"id"` is always derivable through [`Record::field_value`].
pub trait Record: Clone + Send + Sync + 'static {
    /// The plural resource name used in URLs (e.g., "buses", "routes")
    fn resource_name() -> &'static str;

    /// Unique identifier of this record
    fn id(&self) -> &str;

    /// Replace the identifier (used by stores that assign ids on create)
    fn set_id(&mut self, id: String);

    /// Read a named attribute, `None` when the record has no such field
    fn field_value(&self, field: &str) -> Option<FieldValue>;

    /// Ordered list of attribute names, used as CSV columns
    fn field_names() -> &'static [&'static str];

    /// Text form of a field, missing values read as the empty string
    fn field_text(&self, field: &str) -> String {
        self.field_value(field)
            .map(|v| v.to_text())
            .unwrap_or_default()
    }
}

/// A record backed by an untyped JSON object.
///
/// [`DynamicRecord::from_json`] is the single ingestion point for loosely
/// typed payloads: once a record is built, every attribute has an explicit
/// [`FieldValue`] and missing attributes are simply absent. Deserializing a
/// `DynamicRecord` goes through the same path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct DynamicRecord {
    pub id: String,
    #[serde(flatten)]
    pub fields: IndexMap<String, FieldValue>,
}

impl DynamicRecord {
    /// Build a record from a JSON object
    ///
    /// The `id` attribute is required and may be a string or a number. Every
    /// other attribute is converted with [`FieldValue::from_json`].
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let obj = value.as_object().ok_or_else(|| ValidationError::InvalidJson {
            message: "record payload must be a JSON object".to_string(),
        })?;

        let id = match obj.get("id") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(ValidationError::FieldError {
                    field: "id".to_string(),
                    message: "record id is required".to_string(),
                });
            }
        };

        let fields = obj
            .iter()
            .filter(|(key, _)| key.as_str() != "id")
            .map(|(key, v)| (key.clone(), FieldValue::from_json(v)))
            .collect();

        Ok(Self { id, fields })
    }

    /// Build a record directly from already-typed fields
    pub fn new(id: impl Into<String>, fields: IndexMap<String, FieldValue>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

impl TryFrom<Value> for DynamicRecord {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(&value)
    }
}

impl Record for DynamicRecord {
    fn resource_name() -> &'static str {
        "records"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        if field == "id" {
            return Some(FieldValue::String(self.id.clone()));
        }
        self.fields.get(field).cloned()
    }

    fn field_names() -> &'static [&'static str] {
        &["id"]
    }
}

impl Validatable for DynamicRecord {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_requires_id() {
        let err = DynamicRecord::from_json(&json!({"status": "active"})).unwrap_err();
        assert!(matches!(err, ValidationError::FieldError { ref field, .. } if field == "id"));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = DynamicRecord::from_json(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidJson { .. }));
    }

    #[test]
    fn test_numeric_id_is_stringified() {
        let record = DynamicRecord::from_json(&json!({"id": 17, "capacity": 40})).unwrap();
        assert_eq!(record.id(), "17");
        assert_eq!(record.field_value("capacity"), Some(FieldValue::Integer(40)));
    }

    #[test]
    fn test_missing_field_reads_empty_text() {
        let record = DynamicRecord::from_json(&json!({"id": "b1"})).unwrap();
        assert_eq!(record.field_value("route"), None);
        assert_eq!(record.field_text("route"), "");
        assert_eq!(record.field_text("id"), "b1");
    }

    #[test]
    fn test_deserialize_matches_from_json() {
        let payload = json!({"id": 9, "issued_at": "2026-05-20T08:00:00Z", "fare": 25.5});

        let via_serde: DynamicRecord = serde_json::from_value(payload.clone()).unwrap();
        let via_json = DynamicRecord::from_json(&payload).unwrap();
        assert_eq!(via_serde, via_json);
        assert_eq!(via_serde.id(), "9");
        assert!(matches!(
            via_serde.field_value("issued_at"),
            Some(FieldValue::DateTime(_))
        ));
    }

    #[test]
    fn test_serde_roundtrip_keeps_timestamps() {
        let record = DynamicRecord::from_json(&json!({
            "id": "t1",
            "issued_at": "2026-05-20T08:00:00Z",
            "route": null,
        }))
        .unwrap();

        let json = serde_json::to_string(&record).unwrap();
        let restored: DynamicRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn test_deserialize_without_id_fails() {
        let result: Result<DynamicRecord, _> = serde_json::from_value(json!({"fare": 10}));
        assert!(result.is_err());
    }
}
