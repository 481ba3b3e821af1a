//! Sort comparator for record lists

use crate::core::field::FieldValue;
use crate::core::record::Record;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// The opposite direction
    pub fn reversed(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

/// Sort key and direction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    /// Field to sort by; empty keeps the input order
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    /// Parse the `field:dir` shorthand (`field` alone sorts ascending)
    pub fn parse(expr: &str) -> Self {
        match expr.split_once(':') {
            Some((field, dir)) => Self::new(field, dir.parse().unwrap_or_default()),
            None => Self::asc(expr),
        }
    }

    /// Toggle: same field flips direction, a new field starts ascending
    pub fn toggled(&self, field: &str) -> Self {
        if self.field == field {
            Self::new(field, self.direction.reversed())
        } else {
            Self::asc(field)
        }
    }
}

/// Compare two field values the way list columns are ordered
///
/// Numbers compare numerically and timestamps chronologically; text is
/// case-folded first with the raw text as a tie-break. Values of different
/// kinds order by kind: missing, numbers, timestamps, then text. Missing
/// values read as the empty string, so they lead like `""` does.
pub fn compare_values(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) if x.is_numeric() && y.is_numeric() => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (Some(FieldValue::DateTime(x)), Some(FieldValue::DateTime(y))) => x.cmp(y),
        _ => kind_rank(a).cmp(&kind_rank(b)).then_with(|| {
            let x = a.map(FieldValue::to_text).unwrap_or_default();
            let y = b.map(FieldValue::to_text).unwrap_or_default();
            compare_text(&x, &y)
        }),
    }
}

fn kind_rank(value: Option<&FieldValue>) -> u8 {
    match value {
        None | Some(FieldValue::Null) => 0,
        Some(FieldValue::Integer(_) | FieldValue::Float(_)) => 1,
        Some(FieldValue::DateTime(_)) => 2,
        Some(FieldValue::String(_) | FieldValue::Boolean(_)) => 3,
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

/// Compare two records under `state`
///
/// An empty sort field is the identity: every pair compares equal.
pub fn compare<R: Record>(a: &R, b: &R, state: &SortState) -> Ordering {
    if state.field.is_empty() {
        return Ordering::Equal;
    }
    let ordering = compare_values(
        a.field_value(&state.field).as_ref(),
        b.field_value(&state.field).as_ref(),
    );
    match state.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Stable sort producing a new vector; the input slice is not modified
pub fn sort_records<R: Record>(records: &[R], state: &SortState) -> Vec<R> {
    let mut sorted = records.to_vec();
    if !state.field.is_empty() {
        sorted.sort_by(|a, b| compare(a, b, state));
    }
    sorted
}
