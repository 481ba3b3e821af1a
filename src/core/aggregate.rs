//! Summary statistics over filtered record sets
//!
//! Stat cards, category breakdowns and trend charts are all described by
//! [`MetricSpec`] values, so a page's analytics live in configuration rather
//! than code. Every metric kind tolerates an empty input and yields zeros.

use crate::core::record::Record;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Label used for records with no value in a breakdown dimension
pub const UNSPECIFIED: &str = "Unspecified";

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Equality sub-predicate (e.g. `status == "active"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub equals: String,
}

impl Condition {
    pub fn new(field: impl Into<String>, equals: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            equals: equals.into(),
        }
    }

    pub fn matches<R: Record>(&self, record: &R) -> bool {
        record
            .field_value(&self.field)
            .is_some_and(|v| !v.is_null() && v.to_text() == self.equals)
    }
}

/// What a breakdown group measures
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BreakdownValue {
    #[default]
    Count,
    Sum {
        field: String,
    },
}

/// Time bucket used by trend series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendBucket {
    /// Seven points, Monday first
    DayOfWeek,
    /// Twenty-four points, one per hour of day
    Hour,
    /// One point per calendar day between the earliest and latest record
    IsoDate,
}

/// A value computed for every trend bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendValue {
    pub name: String,
    #[serde(flatten)]
    pub kind: TrendValueKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrendValueKind {
    Count,
    Sum {
        field: String,
    },
    Average {
        field: String,
    },
    /// Percentage of the bucket's records matching the condition
    Rate {
        #[serde(rename = "where")]
        condition: Condition,
    },
}

/// A named metric to compute over a record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricSpec {
    /// Number of records, optionally restricted by a condition
    Count {
        name: String,
        #[serde(default, rename = "where")]
        condition: Option<Condition>,
    },

    /// Sum of a numeric field
    Sum { name: String, field: String },

    /// Mean of a numeric field over records that have one
    Average { name: String, field: String },

    /// Group by a categorical dimension
    Breakdown {
        name: String,
        dimension: String,
        #[serde(default)]
        value: BreakdownValue,
        #[serde(default)]
        top: Option<usize>,
        #[serde(default)]
        other_label: Option<String>,
    },

    /// Time-bucketed series
    Trend {
        name: String,
        date_field: String,
        bucket: TrendBucket,
        values: Vec<TrendValue>,
    },
}

impl MetricSpec {
    pub fn count(name: impl Into<String>) -> Self {
        MetricSpec::Count {
            name: name.into(),
            condition: None,
        }
    }

    pub fn count_where(name: impl Into<String>, condition: Condition) -> Self {
        MetricSpec::Count {
            name: name.into(),
            condition: Some(condition),
        }
    }

    pub fn sum(name: impl Into<String>, field: impl Into<String>) -> Self {
        MetricSpec::Sum {
            name: name.into(),
            field: field.into(),
        }
    }

    pub fn average(name: impl Into<String>, field: impl Into<String>) -> Self {
        MetricSpec::Average {
            name: name.into(),
            field: field.into(),
        }
    }

    pub fn breakdown(name: impl Into<String>, dimension: impl Into<String>) -> Self {
        MetricSpec::Breakdown {
            name: name.into(),
            dimension: dimension.into(),
            value: BreakdownValue::Count,
            top: None,
            other_label: None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            MetricSpec::Count { name, .. }
            | MetricSpec::Sum { name, .. }
            | MetricSpec::Average { name, .. }
            | MetricSpec::Breakdown { name, .. }
            | MetricSpec::Trend { name, .. } => name,
        }
    }
}

/// One group of a breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownEntry {
    pub label: String,
    pub value: f64,
    pub percentage_of_total: f64,
}

/// One point of a trend series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub label: String,
    pub values: IndexMap<String, f64>,
}

/// Computed statistics, keyed by metric name in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    #[serde(default)]
    pub metrics: IndexMap<String, f64>,
    #[serde(default)]
    pub breakdowns: IndexMap<String, Vec<BreakdownEntry>>,
    #[serde(default)]
    pub trends: IndexMap<String, Vec<TrendPoint>>,
}

impl AggregateResult {
    /// Scalar metric value, 0 when not computed
    pub fn metric(&self, name: &str) -> f64 {
        self.metrics.get(name).copied().unwrap_or(0.0)
    }

    pub fn breakdown(&self, name: &str) -> &[BreakdownEntry] {
        self.breakdowns.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn trend(&self, name: &str) -> &[TrendPoint] {
        self.trends.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Compute every metric in `specs` over `records`
pub fn aggregate<R: Record>(records: &[R], specs: &[MetricSpec]) -> AggregateResult {
    let mut result = AggregateResult::default();

    for spec in specs {
        match spec {
            MetricSpec::Count { name, condition } => {
                let n = match condition {
                    Some(c) => records.iter().filter(|r| c.matches(*r)).count(),
                    None => records.len(),
                };
                result.metrics.insert(name.clone(), n as f64);
            }
            MetricSpec::Sum { name, field } => {
                result.metrics.insert(name.clone(), sum(records.iter(), field));
            }
            MetricSpec::Average { name, field } => {
                result
                    .metrics
                    .insert(name.clone(), average(records.iter(), field));
            }
            MetricSpec::Breakdown {
                name,
                dimension,
                value,
                top,
                other_label,
            } => {
                let entries = breakdown(records, dimension, value, *top, other_label.as_deref());
                result.breakdowns.insert(name.clone(), entries);
            }
            MetricSpec::Trend {
                name,
                date_field,
                bucket,
                values,
            } => {
                result
                    .trends
                    .insert(name.clone(), trend(records, date_field, *bucket, values));
            }
        }
    }

    result
}

fn numeric_value<R: Record>(record: &R, field: &str) -> Option<f64> {
    record.field_value(field).and_then(|v| v.as_f64())
}

fn sum<'a, R: Record>(records: impl Iterator<Item = &'a R>, field: &str) -> f64 {
    records.filter_map(|r| numeric_value(r, field)).sum()
}

fn average<'a, R: Record>(records: impl Iterator<Item = &'a R>, field: &str) -> f64 {
    let (total, n) = records
        .filter_map(|r| numeric_value(r, field))
        .fold((0.0, 0usize), |(t, n), v| (t + v, n + 1));
    if n == 0 { 0.0 } else { total / n as f64 }
}

fn group_label<R: Record>(record: &R, dimension: &str) -> String {
    match record.field_value(dimension) {
        Some(v) if !v.is_null() && !v.to_text().is_empty() => v.to_text(),
        _ => UNSPECIFIED.to_string(),
    }
}

fn breakdown<R: Record>(
    records: &[R],
    dimension: &str,
    value: &BreakdownValue,
    top: Option<usize>,
    other_label: Option<&str>,
) -> Vec<BreakdownEntry> {
    let mut groups: IndexMap<String, f64> = IndexMap::new();
    for record in records {
        let contribution = match value {
            BreakdownValue::Count => 1.0,
            BreakdownValue::Sum { field } => record
                .field_value(field)
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0),
        };
        *groups.entry(group_label(record, dimension)).or_insert(0.0) += contribution;
    }

    let mut entries: Vec<(String, f64)> = groups.into_iter().collect();
    // stable: ties keep first-appearance order
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));

    let percentages = largest_remainder(&entries.iter().map(|(_, v)| *v).collect::<Vec<_>>());

    let mut out: Vec<BreakdownEntry> = entries
        .into_iter()
        .zip(percentages)
        .map(|((label, value), pct)| BreakdownEntry {
            label,
            value,
            percentage_of_total: pct,
        })
        .collect();

    if let Some(limit) = top {
        if out.len() > limit {
            let rest = out.split_off(limit);
            if let Some(label) = other_label {
                out.push(BreakdownEntry {
                    label: label.to_string(),
                    value: rest.iter().map(|e| e.value).sum(),
                    percentage_of_total: rest.iter().map(|e| e.percentage_of_total).sum(),
                });
            }
        }
    }

    out
}

/// Whole-number percentages of `values` that sum to exactly 100 whenever any
/// value is positive; all zeros otherwise
///
/// Negative and non-finite values weigh nothing. Each share is rounded down
/// and the remaining points go to the largest fractional parts, earlier
/// entries first on ties.
fn largest_remainder(values: &[f64]) -> Vec<f64> {
    let weights: Vec<f64> = values
        .iter()
        .map(|v| if v.is_finite() && *v > 0.0 { *v } else { 0.0 })
        .collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return vec![0.0; values.len()];
    }

    let exact: Vec<f64> = weights.iter().map(|w| w / total * 100.0).collect();
    let mut floors: Vec<f64> = exact.iter().map(|e| e.floor()).collect();
    let assigned: f64 = floors.iter().sum();
    let mut leftover = (100.0 - assigned).round().max(0.0) as usize;

    let mut order: Vec<usize> = (0..exact.len()).collect();
    order.sort_by(|&a, &b| (exact[b] - floors[b]).total_cmp(&(exact[a] - floors[a])));

    for idx in order.into_iter().cycle() {
        if leftover == 0 {
            break;
        }
        floors[idx] += 1.0;
        leftover -= 1;
    }

    floors
}

fn bucket_labels(bucket: TrendBucket, dates: &[DateTime<Utc>]) -> Vec<String> {
    match bucket {
        TrendBucket::DayOfWeek => WEEKDAYS.iter().map(|d| d.to_string()).collect(),
        TrendBucket::Hour => (0..24).map(|h| format!("{:02}:00", h)).collect(),
        TrendBucket::IsoDate => {
            let first = dates.iter().map(|d| d.date_naive()).min();
            let last = dates.iter().map(|d| d.date_naive()).max();
            match (first, last) {
                (Some(first), Some(last)) => days_between(first, last)
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .collect(),
                _ => Vec::new(),
            }
        }
    }
}

fn days_between(first: NaiveDate, last: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let days = (last - first).num_days().max(0);
    (0..=days).map(move |offset| first + Duration::days(offset))
}

fn bucket_label(bucket: TrendBucket, at: DateTime<Utc>) -> String {
    match bucket {
        TrendBucket::DayOfWeek => WEEKDAYS[at.weekday().num_days_from_monday() as usize].to_string(),
        TrendBucket::Hour => format!("{:02}:00", at.hour()),
        TrendBucket::IsoDate => at.format("%Y-%m-%d").to_string(),
    }
}

fn trend<R: Record>(
    records: &[R],
    date_field: &str,
    bucket: TrendBucket,
    values: &[TrendValue],
) -> Vec<TrendPoint> {
    let dated: Vec<(DateTime<Utc>, &R)> = records
        .iter()
        .filter_map(|r| {
            r.field_value(date_field)
                .and_then(|v| v.as_datetime())
                .map(|at| (at, r))
        })
        .collect();

    let dates: Vec<DateTime<Utc>> = dated.iter().map(|(at, _)| *at).collect();
    let mut buckets: IndexMap<String, Vec<&R>> = bucket_labels(bucket, &dates)
        .into_iter()
        .map(|label| (label, Vec::new()))
        .collect();

    for (at, record) in dated {
        buckets.entry(bucket_label(bucket, at)).or_default().push(record);
    }

    buckets
        .into_iter()
        .map(|(label, members)| {
            let values = values
                .iter()
                .map(|tv| (tv.name.clone(), trend_value(&members, &tv.kind)))
                .collect();
            TrendPoint { label, values }
        })
        .collect()
}

fn trend_value<R: Record>(members: &[&R], kind: &TrendValueKind) -> f64 {
    match kind {
        TrendValueKind::Count => members.len() as f64,
        TrendValueKind::Sum { field } => sum(members.iter().copied(), field),
        TrendValueKind::Average { field } => average(members.iter().copied(), field),
        TrendValueKind::Rate { condition } => {
            if members.is_empty() {
                0.0
            } else {
                let hits = members.iter().filter(|r| condition.matches(**r)).count();
                hits as f64 / members.len() as f64 * 100.0
            }
        }
    }
}
