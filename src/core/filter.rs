//! Filter predicate evaluation
//!
//! A record passes a [`FilterState`] only when it passes every active filter
//! and the free-text search. Evaluation is pure: the current instant is an
//! explicit argument so date windows are reproducible in tests.

use crate::core::record::Record;
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel value meaning "no constraint" for categorical filters
pub const ALL: &str = "all";

/// Relative date window for date filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DateWindow {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl DateWindow {
    /// Earliest instant admitted by this window, `None` for [`DateWindow::All`]
    pub fn window_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            DateWindow::Today => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc()),
            DateWindow::Last7Days => Some(now - Duration::days(7)),
            DateWindow::Last30Days => Some(now - Duration::days(30)),
            DateWindow::All => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DateWindow::Today => "today",
            DateWindow::Last7Days => "7d",
            DateWindow::Last30Days => "30d",
            DateWindow::All => "all",
        }
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(DateWindow::Today),
            "7d" => Ok(DateWindow::Last7Days),
            "30d" => Ok(DateWindow::Last30Days),
            "all" => Ok(DateWindow::All),
            other => Err(format!("unknown date window '{}'", other)),
        }
    }
}

/// A single filter applied to one record field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Filter {
    /// Exact match on a categorical field; `"all"` admits everything
    Categorical { field: String, value: String },

    /// Inclusive numeric bounds, either side optional
    NumericRange {
        field: String,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },

    /// Record date must fall inside a relative window
    DateWindow { field: String, window: DateWindow },
}

impl Filter {
    /// Categorical filter on `field`
    pub fn categorical(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Categorical {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Numeric range filter on `field`
    pub fn range(field: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Filter::NumericRange {
            field: field.into(),
            min,
            max,
        }
    }

    /// Date window filter on `field`
    pub fn date_window(field: impl Into<String>, window: DateWindow) -> Self {
        Filter::DateWindow {
            field: field.into(),
            window,
        }
    }

    /// The record field this filter reads
    pub fn field(&self) -> &str {
        match self {
            Filter::Categorical { field, .. }
            | Filter::NumericRange { field, .. }
            | Filter::DateWindow { field, .. } => field,
        }
    }

    /// Whether this filter constrains anything at all
    pub fn is_active(&self) -> bool {
        match self {
            Filter::Categorical { value, .. } => value != ALL,
            Filter::NumericRange { min, max, .. } => min.is_some() || max.is_some(),
            Filter::DateWindow { window, .. } => *window != DateWindow::All,
        }
    }

    /// Evaluate this filter against a record
    ///
    /// Inactive filters always pass. Active filters fail on missing or
    /// mistyped fields.
    pub fn matches<R: Record>(&self, record: &R, now: DateTime<Utc>) -> bool {
        if !self.is_active() {
            return true;
        }

        let Some(value) = record.field_value(self.field()) else {
            return false;
        };

        match self {
            Filter::Categorical { value: wanted, .. } => {
                !value.is_null() && value.to_text() == *wanted
            }
            Filter::NumericRange { min, max, .. } => match value.as_f64() {
                Some(n) => min.is_none_or(|lo| n >= lo) && max.is_none_or(|hi| n <= hi),
                None => false,
            },
            Filter::DateWindow { window, .. } => {
                match (value.as_datetime(), window.window_start(now)) {
                    (Some(at), Some(start)) => at >= start,
                    (_, None) => true,
                    (None, Some(_)) => false,
                }
            }
        }
    }
}

/// The set of filters currently applied on a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    /// Named filters, keyed by filter name (not necessarily the field name)
    #[serde(default)]
    pub filters: IndexMap<String, Filter>,

    /// Free-text search term, compared case-insensitively
    #[serde(default)]
    pub search: String,

    /// Fields the search term is matched against
    #[serde(default)]
    pub search_fields: Vec<String>,
}

impl FilterState {
    /// Empty filter state searching the given fields
    pub fn new<I, S>(search_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            filters: IndexMap::new(),
            search: String::new(),
            search_fields: search_fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Return a copy with `name` set to `filter`
    pub fn with_filter(mut self, name: impl Into<String>, filter: Filter) -> Self {
        self.filters.insert(name.into(), filter);
        self
    }

    /// Return a copy with the search term replaced
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    /// Reset every filter and the search term, keeping the search fields
    pub fn clear(&mut self) {
        self.filters.clear();
        self.search.clear();
    }

    /// Whether any filter or search actually constrains the result
    pub fn is_active(&self) -> bool {
        !self.search.trim().is_empty() || self.filters.values().any(Filter::is_active)
    }

    fn matches_search<R: Record>(&self, record: &R) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.search_fields
            .iter()
            .any(|field| record.field_text(field).to_lowercase().contains(&needle))
    }
}

/// Whether `record` passes every filter in `state` (logical AND)
pub fn matches<R: Record>(record: &R, state: &FilterState, now: DateTime<Utc>) -> bool {
    state.matches_search(record) && state.filters.values().all(|f| f.matches(record, now))
}

/// Narrow `records` to those passing `state`, leaving the input untouched
pub fn filter_records<R: Record>(records: &[R], state: &FilterState, now: DateTime<Utc>) -> Vec<R> {
    records
        .iter()
        .filter(|r| matches(*r, state, now))
        .cloned()
        .collect()
}
