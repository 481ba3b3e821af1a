//! Reusable field normalizers
//!
//! These run on a submitted form before validation (e.g., trimming a plate
//! number the user pasted with a trailing space).

use anyhow::Result;
use serde_json::{Value, json};

/// Filter: trim whitespace from string
pub fn trim() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| {
        if let Some(s) = value.as_str() {
            Ok(Value::String(s.trim().to_string()))
        } else {
            Ok(value)
        }
    }
}

/// Filter: convert string to uppercase
pub fn uppercase() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| {
        if let Some(s) = value.as_str() {
            Ok(Value::String(s.to_uppercase()))
        } else {
            Ok(value)
        }
    }
}

/// Filter: parse a numeric string into a number, leaving other values alone
///
/// Form inputs often submit `"45"` for numeric fields.
pub fn parse_number() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| {
        let Some(s) = value.as_str() else {
            return Ok(value);
        };
        let s = s.trim();
        if let Ok(n) = s.parse::<i64>() {
            Ok(json!(n))
        } else if let Ok(n) = s.parse::<f64>() {
            Ok(json!(n))
        } else {
            Ok(value)
        }
    }
}

/// Filter: round a number to `decimals` places (distances, fares)
pub fn round_decimals(
    decimals: u32,
) -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    move |_: &str, value: Value| {
        if let Some(num) = value.as_f64() {
            let factor = 10_f64.powi(decimals as i32);
            let rounded = (num * factor).round() / factor;
            Ok(json!(rounded))
        } else {
            Ok(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_and_uppercase() {
        let value = trim()("plateNumber", json!("  ka-01-f-1234 ")).unwrap();
        let value = uppercase()("plateNumber", value).unwrap();
        assert_eq!(value, json!("KA-01-F-1234"));
    }

    #[test]
    fn test_non_strings_pass_through() {
        assert_eq!(trim()("capacity", json!(45)).unwrap(), json!(45));
        assert_eq!(uppercase()("active", json!(true)).unwrap(), json!(true));
    }

    #[test]
    fn test_parse_number() {
        let f = parse_number();
        assert_eq!(f("capacity", json!("45")).unwrap(), json!(45));
        assert_eq!(f("distanceKm", json!(" 12.5 ")).unwrap(), json!(12.5));
        assert_eq!(f("capacity", json!("lots")).unwrap(), json!("lots"));
    }

    #[test]
    fn test_round_decimals() {
        let f = round_decimals(1);
        assert_eq!(f("distanceKm", json!(18.46)).unwrap(), json!(18.5));
        assert_eq!(f("distanceKm", json!("far")).unwrap(), json!("far"));
    }
}
