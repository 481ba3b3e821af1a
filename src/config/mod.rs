//! Console page configuration loading and management
//!
//! Each list page of the console (buses, routes, schedules, revenue,
//! salaries) is described by a [`PageConfig`]: how it pages, which filters it
//! offers, what it searches and which statistics it shows.

use crate::core::aggregate::{BreakdownValue, Condition, MetricSpec, TrendBucket, TrendValue, TrendValueKind};
use crate::core::error::ConfigError;
use crate::core::filter::FilterState;
use crate::core::pager::PageState;
use crate::core::pipeline::QueryState;
use crate::core::sort::SortState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Hard upper bound on page sizes accepted from configuration or query strings
pub const MAX_PAGE_SIZE: usize = 100;

/// Where list filtering happens for a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListMode {
    /// Load a full snapshot once and filter/sort/page locally
    #[default]
    Client,
    /// Send every query to the backend and show exactly what it returns
    Server,
}

/// Which record set a page's statistics reflect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsScope {
    /// Stat cards follow the active filters
    #[default]
    Filtered,
    /// Stat cards always show totals for the whole dataset
    Unfiltered,
}

/// Kind of a page filter control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Categorical,
    NumericRange,
    DateWindow,
}

/// A filter control offered by a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDefinition {
    /// Name used in query parameters and filter state
    pub name: String,
    /// Record field the filter reads
    pub field: String,
    pub kind: FilterKind,
}

impl FilterDefinition {
    pub fn new(name: impl Into<String>, field: impl Into<String>, kind: FilterKind) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            kind,
        }
    }
}

fn default_page_size() -> usize {
    10
}

fn default_debounce_ms() -> u64 {
    300
}

/// Configuration for one list page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    /// Plural resource name (e.g., "buses")
    pub resource: String,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Quiet period before search/filter changes trigger a query
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default)]
    pub mode: ListMode,

    #[serde(default)]
    pub stats_scope: StatsScope,

    /// Fields matched by the free-text search box
    #[serde(default)]
    pub search_fields: Vec<String>,

    #[serde(default)]
    pub default_sort: SortState,

    #[serde(default)]
    pub filters: Vec<FilterDefinition>,

    #[serde(default)]
    pub metrics: Vec<MetricSpec>,
}

impl PageConfig {
    /// A page with defaults: client mode, 10 rows, 300ms debounce
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            mode: ListMode::default(),
            stats_scope: StatsScope::default(),
            search_fields: Vec::new(),
            default_sort: SortState::default(),
            filters: Vec::new(),
            metrics: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: ListMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    pub fn with_stats_scope(mut self, scope: StatsScope) -> Self {
        self.stats_scope = scope;
        self
    }

    pub fn with_search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_sort(mut self, sort: SortState) -> Self {
        self.default_sort = sort;
        self
    }

    pub fn with_filter(mut self, name: &str, field: &str, kind: FilterKind) -> Self {
        self.filters.push(FilterDefinition::new(name, field, kind));
        self
    }

    pub fn with_metric(mut self, metric: MetricSpec) -> Self {
        self.metrics.push(metric);
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Look up a filter definition by name
    pub fn filter_definition(&self, name: &str) -> Option<&FilterDefinition> {
        self.filters.iter().find(|f| f.name == name)
    }

    /// The query state a page starts in (and returns to on "clear filters")
    pub fn initial_state(&self) -> QueryState {
        QueryState {
            filters: FilterState::new(self.search_fields.iter().cloned()),
            sort: self.default_sort.clone(),
            page: PageState::new(0, self.page_size),
        }
    }

    /// Check the page for values the pipeline cannot work with
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.resource.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "resource".to_string(),
                value: self.resource.clone(),
                message: "resource name cannot be empty".to_string(),
            });
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: format!("{}.page_size", self.resource),
                value: self.page_size.to_string(),
                message: format!("must be between 1 and {}", MAX_PAGE_SIZE),
            });
        }

        let mut names = HashSet::new();
        for filter in &self.filters {
            if !names.insert(filter.name.as_str()) {
                return Err(ConfigError::Duplicate {
                    context: format!("filter in page '{}'", self.resource),
                    name: filter.name.clone(),
                });
            }
        }

        let mut metrics = HashSet::new();
        for metric in &self.metrics {
            if !metrics.insert(metric.name()) {
                return Err(ConfigError::Duplicate {
                    context: format!("metric in page '{}'", self.resource),
                    name: metric.name().to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Complete configuration for the console
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub pages: Vec<PageConfig>,
}

impl ConsoleConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.to_string()),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file: None,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Merge several configurations; a later page replaces an earlier page
    /// with the same resource, keeping the earlier page's position
    pub fn merge(configs: Vec<ConsoleConfig>) -> Self {
        let mut pages: Vec<PageConfig> = Vec::new();
        for config in configs {
            for page in config.pages {
                match pages.iter_mut().find(|p| p.resource == page.resource) {
                    Some(existing) => *existing = page,
                    None => pages.push(page),
                }
            }
        }
        Self { pages }
    }

    /// Find the page configured for `resource`
    pub fn page(&self, resource: &str) -> std::result::Result<&PageConfig, ConfigError> {
        self.pages
            .iter()
            .find(|p| p.resource == resource)
            .ok_or_else(|| ConfigError::UnknownResource {
                resource: resource.to_string(),
            })
    }

    /// Validate every page and resource uniqueness
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for page in &self.pages {
            if !seen.insert(page.resource.as_str()) {
                return Err(ConfigError::Duplicate {
                    context: "page".to_string(),
                    name: page.resource.clone(),
                });
            }
            page.validate()?;
        }
        Ok(())
    }

    /// The stock console pages
    pub fn default_config() -> Self {
        let buses = PageConfig::new("buses")
            .with_mode(ListMode::Server)
            .with_search_fields(["id", "plate_number", "operator_name", "route_name"])
            .with_default_sort(SortState::asc("plate_number"))
            .with_filter("status", "status", FilterKind::Categorical)
            .with_filter("busType", "bus_type", FilterKind::Categorical)
            .with_filter("capacity", "capacity", FilterKind::NumericRange)
            .with_filter("registered", "registered_at", FilterKind::DateWindow)
            .with_metric(MetricSpec::count("total"))
            .with_metric(MetricSpec::count_where("active", Condition::new("status", "active")))
            .with_metric(MetricSpec::count_where(
                "maintenance",
                Condition::new("status", "maintenance"),
            ))
            .with_metric(MetricSpec::average("average_capacity", "capacity"))
            .with_metric(MetricSpec::breakdown("by_type", "bus_type"));

        let routes = PageConfig::new("routes")
            .with_mode(ListMode::Server)
            .with_search_fields(["id", "name", "origin", "destination"])
            .with_default_sort(SortState::asc("name"))
            .with_filter("status", "status", FilterKind::Categorical)
            .with_filter("region", "region", FilterKind::Categorical)
            .with_filter("distance", "distance_km", FilterKind::NumericRange)
            .with_metric(MetricSpec::count("total"))
            .with_metric(MetricSpec::count_where("active", Condition::new("status", "active")))
            .with_metric(MetricSpec::average("average_distance", "distance_km"))
            .with_metric(MetricSpec::average("average_duration", "duration_minutes"));

        let schedules = PageConfig::new("schedules")
            .with_search_fields(["id", "route_name", "bus_plate"])
            .with_default_sort(SortState::asc("departure_at"))
            .with_filter("status", "status", FilterKind::Categorical)
            .with_filter("departure", "departure_at", FilterKind::DateWindow)
            .with_metric(MetricSpec::count("total"))
            .with_metric(MetricSpec::count_where(
                "completed",
                Condition::new("status", "completed"),
            ))
            .with_metric(MetricSpec::Trend {
                name: "weekly_trips".to_string(),
                date_field: "departure_at".to_string(),
                bucket: TrendBucket::DayOfWeek,
                values: vec![
                    TrendValue {
                        name: "trips".to_string(),
                        kind: TrendValueKind::Count,
                    },
                    TrendValue {
                        name: "on_time_rate".to_string(),
                        kind: TrendValueKind::Rate {
                            condition: Condition::new("on_time", "true"),
                        },
                    },
                ],
            });

        let tickets = PageConfig::new("tickets")
            .with_page_size(20)
            .with_search_fields(["id", "route_name", "payment_method"])
            .with_default_sort(SortState::desc("issued_at"))
            .with_filter("route", "route_name", FilterKind::Categorical)
            .with_filter("paymentMethod", "payment_method", FilterKind::Categorical)
            .with_filter("issued", "issued_at", FilterKind::DateWindow)
            .with_metric(MetricSpec::count("tickets_sold"))
            .with_metric(MetricSpec::sum("total_revenue", "fare"))
            .with_metric(MetricSpec::average("average_fare", "fare"))
            .with_metric(MetricSpec::Breakdown {
                name: "revenue_by_route".to_string(),
                dimension: "route_name".to_string(),
                value: BreakdownValue::Sum {
                    field: "fare".to_string(),
                },
                top: Some(4),
                other_label: Some("Other".to_string()),
            })
            .with_metric(MetricSpec::Trend {
                name: "daily_revenue".to_string(),
                date_field: "issued_at".to_string(),
                bucket: TrendBucket::IsoDate,
                values: vec![TrendValue {
                    name: "revenue".to_string(),
                    kind: TrendValueKind::Sum {
                        field: "fare".to_string(),
                    },
                }],
            });

        let salaries = PageConfig::new("salaries")
            .with_stats_scope(StatsScope::Unfiltered)
            .with_search_fields(["id", "employee_name", "operator_name"])
            .with_default_sort(SortState::desc("effective_at"))
            .with_filter("role", "role", FilterKind::Categorical)
            .with_filter("status", "status", FilterKind::Categorical)
            .with_filter("amount", "amount", FilterKind::NumericRange)
            .with_metric(MetricSpec::count("employees"))
            .with_metric(MetricSpec::sum("total_payroll", "amount"))
            .with_metric(MetricSpec::average("average_salary", "amount"))
            .with_metric(MetricSpec::Breakdown {
                name: "payroll_by_role".to_string(),
                dimension: "role".to_string(),
                value: BreakdownValue::Sum {
                    field: "amount".to_string(),
                },
                top: None,
                other_label: None,
            });

        Self {
            pages: vec![buses, routes, schedules, tickets, salaries],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConsoleConfig::default_config();
        assert_eq!(config.pages.len(), 5);
        assert!(config.validate().is_ok());
        assert_eq!(config.page("buses").unwrap().mode, ListMode::Server);
        assert_eq!(
            config.page("salaries").unwrap().stats_scope,
            StatsScope::Unfiltered
        );
    }

    #[test]
    fn test_yaml_serialization() {
        let config = ConsoleConfig::default_config();
        let yaml = serde_yaml::to_string(&config).unwrap();

        let parsed = ConsoleConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_yaml_defaults() {
        let parsed = ConsoleConfig::from_yaml_str("pages:\n  - resource: operators\n").unwrap();
        let page = parsed.page("operators").unwrap();
        assert_eq!(page.page_size, 10);
        assert_eq!(page.debounce_ms, 300);
        assert_eq!(page.mode, ListMode::Client);
        assert_eq!(page.stats_scope, StatsScope::Filtered);
    }

    #[test]
    fn test_unknown_resource() {
        let config = ConsoleConfig::default_config();
        assert!(matches!(
            config.page("depots"),
            Err(ConfigError::UnknownResource { .. })
        ));
    }

    #[test]
    fn test_initial_state_uses_page_defaults() {
        let config = ConsoleConfig::default_config();
        let state = config.page("tickets").unwrap().initial_state();
        assert_eq!(state.page, PageState::new(0, 20));
        assert_eq!(state.sort, SortState::desc("issued_at"));
        assert!(state.filters.search_fields.contains(&"route_name".to_string()));
    }
}
