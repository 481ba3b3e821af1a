//! Reusable field validators
//!
//! Each validator receives the field name and the submitted JSON value and
//! returns a user-facing message on failure. Validators other than
//! [`required`] let values of the wrong type pass so they compose.

use regex::Regex;
use serde_json::Value;

/// Validator: field is required (not null, not a blank string)
pub fn required() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        let blank = value.as_str().is_some_and(|s| s.trim().is_empty());
        if value.is_null() || blank {
            Err(format!("'{}' is required", field))
        } else {
            Ok(())
        }
    }
}

/// Validator: number must be positive
pub fn positive() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| match value.as_f64() {
        Some(num) if num <= 0.0 => Err(format!("'{}' must be positive (value: {})", field, num)),
        _ => Ok(()),
    }
}

/// Validator: string length must be within range
pub fn string_length(
    min: usize,
    max: usize,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        if let Some(s) = value.as_str() {
            let len = s.chars().count();
            if len < min {
                Err(format!(
                    "'{}' must be at least {} characters (currently {})",
                    field, min, len
                ))
            } else if len > max {
                Err(format!(
                    "'{}' must not exceed {} characters (currently {})",
                    field, max, len
                ))
            } else {
                Ok(())
            }
        } else {
            Ok(())
        }
    }
}

/// Validator: number must not exceed maximum
pub fn max_value(max: f64) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| match value.as_f64() {
        Some(num) if num > max => Err(format!(
            "'{}' must not exceed {} (value: {})",
            field, max, num
        )),
        _ => Ok(()),
    }
}

/// Validator: value must be in allowed list
pub fn in_list(
    allowed: Vec<String>,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        if let Some(s) = value.as_str() {
            if !allowed.iter().any(|a| a == s) {
                Err(format!(
                    "'{}' must be one of: {} (got '{}')",
                    field,
                    allowed.join(", "),
                    s
                ))
            } else {
                Ok(())
            }
        } else {
            Ok(())
        }
    }
}

/// Validator: timestamp must be RFC 3339 (e.g., "2024-03-01T08:00:00Z")
///
/// Checked here so a bad date is reported next to the field instead of
/// failing deserialization of the whole form.
pub fn date_format() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| match value {
        Value::String(s) => chrono::DateTime::parse_from_rfc3339(s)
            .map(|_| ())
            .map_err(|_| format!("'{}' must be a date and time like 2024-03-01T08:00:00Z", field)),
        Value::Null => Ok(()),
        _ => Err(format!("'{}' must be a date and time", field)),
    }
}

/// Validator: string must match a regular expression
///
/// `description` names the expected shape in the message (e.g., "a plate
/// number like KA-01-F-1234").
pub fn pattern(
    regex: Regex,
    description: &'static str,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        if let Some(s) = value.as_str() {
            if regex.is_match(s) {
                Ok(())
            } else {
                Err(format!("'{}' must be {} (got '{}')", field, description, s))
            }
        } else {
            Ok(())
        }
    }
}
