//! Form schemas: per-field normalizers and validators for create forms

use crate::core::error::{FieldValidationError, ValidationError};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

type Validator = Arc<dyn Fn(&str, &Value) -> Result<(), String> + Send + Sync>;
type Normalizer = Arc<dyn Fn(&str, Value) -> anyhow::Result<Value> + Send + Sync>;

/// Declarative validation rules for a submitted form
///
/// ```rust,ignore
/// let schema = FormSchema::new()
///     .filter("plateNumber", filters::trim())
///     .field("plateNumber", validators::required())
///     .field("capacity", validators::positive());
/// ```
#[derive(Clone, Default)]
pub struct FormSchema {
    validators: IndexMap<String, Vec<Validator>>,
    filters: IndexMap<String, Vec<Normalizer>>,
}

impl std::fmt::Debug for FormSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSchema")
            .field("validated", &self.validators.keys().collect::<Vec<_>>())
            .field("filtered", &self.filters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FormSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validator for a field; validators run in insertion order
    pub fn field<F>(mut self, name: &str, validator: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators
            .entry(name.to_string())
            .or_default()
            .push(Arc::new(validator));
        self
    }

    /// Add a normalizer applied to a field before validation
    pub fn filter<F>(mut self, name: &str, filter: F) -> Self
    where
        F: Fn(&str, Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.filters
            .entry(name.to_string())
            .or_default()
            .push(Arc::new(filter));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty() && self.filters.is_empty()
    }

    /// Validate a payload, collecting every failing field
    pub fn validate(&self, payload: &Value) -> Result<(), ValidationError> {
        let Some(object) = payload.as_object() else {
            return Err(ValidationError::InvalidJson {
                message: "form payload must be a JSON object".to_string(),
            });
        };

        let mut errors = Vec::new();
        for (field, validators) in &self.validators {
            let value = object.get(field).unwrap_or(&Value::Null);
            for validator in validators {
                if let Err(message) = validator(field, value) {
                    errors.push(FieldValidationError {
                        field: field.clone(),
                        message,
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::FieldErrors(errors))
        }
    }

    /// Normalize the submitted fields, then validate the result
    pub fn validate_and_filter(&self, mut payload: Value) -> Result<Value, ValidationError> {
        if let Some(object) = payload.as_object_mut() {
            for (field, filters) in &self.filters {
                let Some(mut value) = object.remove(field) else {
                    continue;
                };
                for filter in filters {
                    value = filter(field, value).map_err(|e| ValidationError::FieldError {
                        field: field.clone(),
                        message: e.to_string(),
                    })?;
                }
                object.insert(field.clone(), value);
            }
        }

        self.validate(&payload)?;
        Ok(payload)
    }
}

/// Records that carry a create-form schema
pub trait Validatable {
    /// The form schema for this record type; empty by default
    fn form_schema() -> FormSchema {
        FormSchema::new()
    }
}
