//! Wire contracts between list pages and their backend
//!
//! A server-paginated page sends a [`ListQuery`] as URL query parameters and
//! receives a [`ListResponse`]:
//!
//! ```text
//! GET /api/buses?page=0&size=10&sortBy=capacity&sortDir=desc&search=ka&status=active&capacityMin=30
//! ```
//!
//! Filters that do not constrain anything (`status=all`, empty search, absent
//! numeric bounds) are omitted from the request entirely.

use crate::config::{FilterKind, MAX_PAGE_SIZE, PageConfig};
use crate::core::error::ValidationError;
use crate::core::filter::{DateWindow, Filter, FilterState};
use crate::core::pager::{Page, PageState};
use crate::core::pipeline::QueryState;
use crate::core::record::Record;
use crate::core::sort::{SortDirection, SortState};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

fn default_size() -> usize {
    10
}

/// List query request parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Zero-based page index
    #[serde(default)]
    pub page: usize,

    /// Number of items per page
    #[serde(default = "default_size")]
    pub size: usize,

    #[serde(default)]
    pub sort_by: String,

    #[serde(default)]
    pub sort_dir: SortDirection,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,

    /// Entity-specific filter parameters, in page order
    #[serde(default, flatten)]
    pub filters: IndexMap<String, String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: default_size(),
            sort_by: String::new(),
            sort_dir: SortDirection::Asc,
            search: None,
            filters: IndexMap::new(),
        }
    }
}

impl ListQuery {
    /// Build the request for `state` using the page's filter definitions
    pub fn from_state(state: &QueryState, config: &PageConfig) -> Self {
        let mut filters = IndexMap::new();

        for (name, filter) in &state.filters.filters {
            if !filter.is_active() {
                continue;
            }
            let name = config
                .filter_definition(name)
                .map(|d| d.name.as_str())
                .unwrap_or(name.as_str());
            match filter {
                Filter::Categorical { value, .. } => {
                    filters.insert(name.to_string(), value.clone());
                }
                Filter::NumericRange { min, max, .. } => {
                    if let Some(min) = min {
                        filters.insert(format!("{}Min", name), min.to_string());
                    }
                    if let Some(max) = max {
                        filters.insert(format!("{}Max", name), max.to_string());
                    }
                }
                Filter::DateWindow { window, .. } => {
                    filters.insert(name.to_string(), window.to_string());
                }
            }
        }

        let search = state.filters.search.trim();

        Self {
            page: state.page.index,
            size: state.page.size,
            sort_by: state.sort.field.clone(),
            sort_dir: state.sort.direction,
            search: (!search.is_empty()).then(|| search.to_string()),
            filters,
        }
    }

    /// Interpret this request against the page's filter definitions
    ///
    /// Unknown parameters are ignored. Malformed numeric bounds or date
    /// windows are rejected.
    pub fn to_state(&self, config: &PageConfig) -> Result<QueryState, ValidationError> {
        let mut filters = FilterState::new(config.search_fields.iter().cloned());
        if let Some(search) = &self.search {
            filters.search = search.clone();
        }

        for def in &config.filters {
            let filter = match def.kind {
                FilterKind::Categorical => self
                    .filters
                    .get(&def.name)
                    .map(|v| Filter::categorical(def.field.clone(), v.clone())),
                FilterKind::NumericRange => {
                    let min = self.bound(&format!("{}Min", def.name))?;
                    let max = self.bound(&format!("{}Max", def.name))?;
                    (min.is_some() || max.is_some()).then(|| Filter::range(def.field.clone(), min, max))
                }
                FilterKind::DateWindow => match self.filters.get(&def.name) {
                    Some(raw) => {
                        let window: DateWindow =
                            raw.parse().map_err(|_| ValidationError::InvalidQuery {
                                param: def.name.clone(),
                                value: raw.clone(),
                            })?;
                        Some(Filter::date_window(def.field.clone(), window))
                    }
                    None => None,
                },
            };
            if let Some(filter) = filter {
                filters.filters.insert(def.name.clone(), filter);
            }
        }

        let sort = if self.sort_by.is_empty() {
            config.default_sort.clone()
        } else {
            SortState::new(self.sort_by.clone(), self.sort_dir)
        };

        Ok(QueryState {
            filters,
            sort,
            page: PageState::new(self.page, self.size),
        })
    }

    fn bound(&self, key: &str) -> Result<Option<f64>, ValidationError> {
        match self.filters.get(key) {
            Some(raw) => raw
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ValidationError::InvalidQuery {
                    param: key.to_string(),
                    value: raw.clone(),
                }),
            None => Ok(None),
        }
    }

    /// Ordered `(key, value)` pairs for a URL query string
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("size".to_string(), self.size.to_string()),
        ];
        if !self.sort_by.is_empty() {
            params.push(("sortBy".to_string(), self.sort_by.clone()));
            params.push(("sortDir".to_string(), self.sort_dir.to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("search".to_string(), search.clone()));
        }
        params.extend(self.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        params
    }

    /// Parse raw query parameters
    ///
    /// Missing values take defaults; `size` is clamped to `1..=100` and an
    /// unknown direction sorts ascending. Non-numeric `page`/`size` are
    /// rejected.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ValidationError> {
        let number = |key: &str, default: usize| -> Result<usize, ValidationError> {
            match params.get(key) {
                Some(raw) => raw.parse().map_err(|_| ValidationError::InvalidQuery {
                    param: key.to_string(),
                    value: raw.clone(),
                }),
                None => Ok(default),
            }
        };

        let page = number("page", 0)?;
        let size = number("size", default_size())?.clamp(1, MAX_PAGE_SIZE);
        let sort_by = params.get("sortBy").cloned().unwrap_or_default();
        let sort_dir = params
            .get("sortDir")
            .and_then(|d| d.parse().ok())
            .unwrap_or_default();
        let search = params
            .get("search")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let reserved = ["page", "size", "sortBy", "sortDir", "search"];
        let mut keys: Vec<&String> = params
            .keys()
            .filter(|k| !reserved.contains(&k.as_str()))
            .collect();
        keys.sort();
        let filters = keys
            .into_iter()
            .map(|k| (k.clone(), params[k].clone()))
            .collect();

        Ok(Self {
            page,
            size,
            sort_by,
            sort_dir,
            search,
            filters,
        })
    }
}

/// Paginated list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    /// The records on this page
    pub content: Vec<T>,

    /// Zero-based index of this page
    pub number: usize,

    pub total_pages: usize,

    /// Total number of records (after filters)
    pub total_elements: usize,

    /// Page size
    pub size: usize,
}

impl<T> ListResponse<T> {
    pub fn empty(size: usize) -> Self {
        Self {
            content: Vec::new(),
            number: 0,
            total_pages: 1,
            total_elements: 0,
            size,
        }
    }

    /// Whether `number` points past the last page of a non-empty result
    pub fn is_out_of_range(&self) -> bool {
        self.total_elements > 0 && self.number >= self.total_pages
    }
}

impl<T> From<Page<T>> for ListResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            content: page.items,
            number: page.index,
            total_pages: page.total_pages,
            total_elements: page.total_elements,
            size: page.size,
        }
    }
}

/// Inclusive numeric bounds observed in a dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericBounds {
    pub min: f64,
    pub max: f64,
}

/// An id/name pair for related-entity dropdowns (e.g., operators)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionPair {
    pub id: String,
    pub name: String,
}

/// Valid values for each filter control of a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    /// Distinct values per categorical filter name
    #[serde(default)]
    pub categorical: IndexMap<String, Vec<String>>,

    /// Observed bounds per numeric filter name
    #[serde(default)]
    pub numeric_ranges: IndexMap<String, NumericBounds>,

    /// Related-entity choices per filter name
    #[serde(default)]
    pub related: IndexMap<String, Vec<OptionPair>>,
}

impl FilterOptions {
    /// Derive choices for a page's filters from the records themselves
    ///
    /// Categorical values are distinct and sorted; null values are skipped.
    /// Numeric filters with no numeric values get no entry.
    pub fn from_records<R: Record>(records: &[R], config: &PageConfig) -> Self {
        let mut options = Self::default();

        for def in &config.filters {
            match def.kind {
                FilterKind::Categorical => {
                    let values: BTreeSet<String> = records
                        .iter()
                        .filter_map(|r| r.field_value(&def.field))
                        .filter(|v| !v.is_null())
                        .map(|v| v.to_text())
                        .collect();
                    options
                        .categorical
                        .insert(def.name.clone(), values.into_iter().collect());
                }
                FilterKind::NumericRange => {
                    let bounds = records
                        .iter()
                        .filter_map(|r| r.field_value(&def.field).and_then(|v| v.as_f64()))
                        .fold(None, |acc: Option<NumericBounds>, n| match acc {
                            None => Some(NumericBounds { min: n, max: n }),
                            Some(b) => Some(NumericBounds {
                                min: b.min.min(n),
                                max: b.max.max(n),
                            }),
                        });
                    if let Some(bounds) = bounds {
                        options.numeric_ranges.insert(def.name.clone(), bounds);
                    }
                }
                FilterKind::DateWindow => {}
            }
        }

        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsoleConfig;

    fn buses() -> PageConfig {
        ConsoleConfig::default_config().page("buses").unwrap().clone()
    }

    #[test]
    fn test_from_state_omits_inactive_filters() {
        let config = buses();
        let mut state = config.initial_state();
        state.filters = state
            .filters
            .with_filter("status", Filter::categorical("status", "all"))
            .with_filter("capacity", Filter::range("capacity", Some(30.0), None))
            .with_filter("registered", Filter::date_window("registered_at", DateWindow::Last7Days))
            .with_search("  ");

        let query = ListQuery::from_state(&state, &config);
        assert_eq!(query.search, None);
        assert!(!query.filters.contains_key("status"));
        assert_eq!(query.filters.get("capacityMin").map(String::as_str), Some("30"));
        assert!(!query.filters.contains_key("capacityMax"));
        assert_eq!(query.filters.get("registered").map(String::as_str), Some("7d"));
    }

    #[test]
    fn test_state_roundtrip_through_params() {
        let config = buses();
        let mut state = config.initial_state();
        state.sort = SortState::desc("capacity");
        state.page = PageState::new(2, 25);
        state.filters = state
            .filters
            .with_filter("status", Filter::categorical("status", "active"))
            .with_filter("capacity", Filter::range("capacity", Some(30.0), Some(55.5)))
            .with_search("ka-01");

        let params: HashMap<String, String> = ListQuery::from_state(&state, &config)
            .to_params()
            .into_iter()
            .collect();
        let parsed = ListQuery::from_params(&params).unwrap().to_state(&config).unwrap();

        assert_eq!(parsed.sort, state.sort);
        assert_eq!(parsed.page, state.page);
        assert_eq!(parsed.filters.search, "ka-01");
        assert_eq!(parsed.filters.filters["status"], state.filters.filters["status"]);
        assert_eq!(parsed.filters.filters["capacity"], state.filters.filters["capacity"]);
    }

    #[test]
    fn test_from_params_defaults_and_clamps() {
        let mut params = HashMap::new();
        params.insert("size".to_string(), "5000".to_string());
        params.insert("sortDir".to_string(), "sideways".to_string());
        let query = ListQuery::from_params(&params).unwrap();
        assert_eq!(query.page, 0);
        assert_eq!(query.size, MAX_PAGE_SIZE);
        assert_eq!(query.sort_dir, SortDirection::Asc);
    }

    #[test]
    fn test_from_params_rejects_bad_page() {
        let mut params = HashMap::new();
        params.insert("page".to_string(), "two".to_string());
        let err = ListQuery::from_params(&params).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidQuery { ref param, .. } if param == "page"));
    }

    #[test]
    fn test_to_state_rejects_bad_bound() {
        let config = buses();
        let mut query = ListQuery::default();
        query.filters.insert("capacityMin".to_string(), "lots".to_string());
        assert!(query.to_state(&config).is_err());
    }

    #[test]
    fn test_empty_sort_uses_page_default() {
        let config = buses();
        let state = ListQuery::default().to_state(&config).unwrap();
        assert_eq!(state.sort, SortState::asc("plate_number"));
    }

    #[test]
    fn test_filter_options_from_records() {
        use crate::core::record::DynamicRecord;
        use serde_json::json;

        let records: Vec<DynamicRecord> = [
            json!({"id": "1", "status": "active", "bus_type": "AC", "capacity": 40}),
            json!({"id": "2", "status": "maintenance", "bus_type": null, "capacity": 52}),
            json!({"id": "3", "status": "active", "bus_type": "Sleeper", "capacity": 30}),
        ]
        .iter()
        .map(|v| DynamicRecord::from_json(v).unwrap())
        .collect();

        let options = FilterOptions::from_records(&records, &buses());
        assert_eq!(options.categorical["status"], vec!["active", "maintenance"]);
        assert_eq!(options.categorical["busType"], vec!["AC", "Sleeper"]);
        assert_eq!(
            options.numeric_ranges["capacity"],
            NumericBounds { min: 30.0, max: 52.0 }
        );
        assert!(!options.categorical.contains_key("registered"));
    }

    #[test]
    fn test_list_response_wire_names() {
        let response: ListResponse<u32> = ListResponse {
            content: vec![1, 2],
            number: 0,
            total_pages: 1,
            total_elements: 2,
            size: 10,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["totalPages"], 1);
        assert_eq!(json["totalElements"], 2);
        assert!(!response.is_out_of_range());
    }
}
