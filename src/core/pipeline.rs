//! The derived-view pipeline: filter, sort, page, aggregate
//!
//! ```text
//! snapshot ──▶ filter ──▶ sort ──▶ clamp page ──▶ paginate ──▶ rows
//!                 │
//!                 └──────────────▶ aggregate ──▶ stat cards
//! ```
//!
//! [`run`] is pure and never touches its input snapshot, so any caller can
//! re-run it on every state change.

use crate::config::StatsScope;
use crate::core::aggregate::{AggregateResult, MetricSpec, aggregate};
use crate::core::filter::{FilterState, filter_records};
use crate::core::pager::{Page, PageState, paginate};
use crate::core::record::Record;
use crate::core::sort::{SortState, sort_records};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The full query shape of a list page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryState {
    pub filters: FilterState,
    pub sort: SortState,
    pub page: PageState,
}

/// Result of running the pipeline over a snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct QueryView<R> {
    /// Visible rows
    pub page: Page<R>,
    /// Page state actually used, after clamping
    pub page_state: PageState,
    /// Statistics over the configured scope
    pub stats: AggregateResult,
}

/// Run filter → sort → clamp → paginate over `snapshot`, plus aggregation
///
/// Statistics are computed over the filtered (pre-pagination) set, or over
/// the whole snapshot when `scope` is [`StatsScope::Unfiltered`].
pub fn run<R: Record>(
    snapshot: &[R],
    state: &QueryState,
    metrics: &[MetricSpec],
    scope: StatsScope,
    now: DateTime<Utc>,
) -> QueryView<R> {
    let filtered = filter_records(snapshot, &state.filters, now);
    let sorted = sort_records(&filtered, &state.sort);
    let page_state = state.page.clamp(sorted.len());
    let page = paginate(&sorted, page_state);

    let stats = match scope {
        StatsScope::Filtered => aggregate(&filtered, metrics),
        StatsScope::Unfiltered => aggregate(snapshot, metrics),
    };

    QueryView {
        page,
        page_state,
        stats,
    }
}
