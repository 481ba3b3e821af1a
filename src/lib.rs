//! # Transit Console
//!
//! The list query and analytics core of a multi-role bus transit
//! management console (buses, routes, schedules, revenue, salaries).
//!
//! ## Features
//!
//! - **Filter / sort / page pipeline**: pure functions over record snapshots
//! - **Aggregation**: counts, sums, averages, breakdowns and time trends for stat cards
//! - **Query controller**: debounced inputs, last-write-wins requests, client or server paging
//! - **Configuration-Based**: pages, filters and metrics defined in YAML
//! - **REST exposure**: serve any `ListSource` with axum
//! - **CSV export**: page or full dataset
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use transit::prelude::*;
//!
//! let config = ConsoleConfig::default_config();
//! let page = config.page("buses")?.clone();
//!
//! let source = Arc::new(InMemorySource::<Bus>::with_records(page.clone(), seed));
//! let controller = QueryController::new(source, page);
//! controller.load().await?;
//!
//! controller.set_search("KA-01");
//! controller.flush().await;
//! println!("{} buses", controller.view().total_elements);
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        aggregate::{AggregateResult, BreakdownEntry, Condition, MetricSpec, TrendPoint, aggregate},
        controller::{LoadStatus, QueryController, ViewState},
        error::{ConsoleError, FetchError, MutationError, ValidationError},
        export::{export_filename, to_csv},
        field::{FieldValue, ToFieldValue},
        filter::{DateWindow, Filter, FilterState, filter_records},
        pager::{Page, PageState, paginate},
        pipeline::{QueryState, QueryView, run},
        query::{FilterOptions, ListQuery, ListResponse},
        record::{DynamicRecord, Record},
        service::ListSource,
        sort::{SortDirection, SortState, sort_records},
        validation::{FormSchema, Validatable, filters, validators},
    };

    // === Macros ===
    pub use crate::impl_record;

    // === Entities ===
    pub use crate::entities::{Bus, Route, SalaryEntry, Schedule, Ticket};

    // === Storage ===
    pub use crate::storage::InMemorySource;
    #[cfg(feature = "http-client")]
    pub use crate::storage::HttpSource;

    // === Config ===
    pub use crate::config::{ConsoleConfig, FilterKind, ListMode, PageConfig, StatsScope};

    // === Server ===
    pub use crate::server::ServerBuilder;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
}
