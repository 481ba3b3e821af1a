//! In-memory implementation of ListSource for testing, demos and mock pages

use crate::config::PageConfig;
use crate::core::aggregate::{AggregateResult, aggregate};
use crate::core::error::{ConsoleError, MutationError};
use crate::core::filter::filter_records;
use crate::core::pager::paginate;
use crate::core::query::{FilterOptions, ListQuery, ListResponse};
use crate::core::record::Record;
use crate::core::service::ListSource;
use crate::core::sort::sort_records;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// In-memory record source
///
/// Answers list queries the way a paginating REST backend would: the
/// requested page is returned as-is, even when it lies past the last page.
/// Uses RwLock for thread-safe access; records keep insertion order.
#[derive(Clone)]
pub struct InMemorySource<T: Record> {
    records: Arc<RwLock<IndexMap<String, T>>>,
    config: Arc<PageConfig>,
}

impl<T: Record> InMemorySource<T> {
    /// Create an empty source serving the given page
    pub fn new(config: PageConfig) -> Self {
        Self {
            records: Arc::new(RwLock::new(IndexMap::new())),
            config: Arc::new(config),
        }
    }

    /// Create a source pre-filled with records
    pub fn with_records(config: PageConfig, records: impl IntoIterator<Item = T>) -> Self {
        let map = records
            .into_iter()
            .map(|r| (r.id().to_string(), r))
            .collect();
        Self {
            records: Arc::new(RwLock::new(map)),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    /// Number of stored records
    pub fn len(&self) -> Result<usize> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        Ok(records.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn snapshot(&self) -> Result<Vec<T>> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        Ok(records.values().cloned().collect())
    }
}

#[async_trait]
impl<T: Record> ListSource<T> for InMemorySource<T> {
    async fn list(&self, query: &ListQuery) -> Result<ListResponse<T>> {
        let state = query.to_state(&self.config).map_err(ConsoleError::from)?;
        let records = self.snapshot()?;

        let filtered = filter_records(&records, &state.filters, Utc::now());
        let sorted = sort_records(&filtered, &state.sort);
        Ok(paginate(&sorted, state.page).into())
    }

    async fn fetch_all(&self) -> Result<Vec<T>> {
        self.snapshot()
    }

    async fn get(&self, id: &str) -> Result<Option<T>> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(records.get(id).cloned())
    }

    async fn filter_options(&self) -> Result<FilterOptions> {
        let records = self.snapshot()?;
        Ok(FilterOptions::from_records(&records, &self.config))
    }

    async fn statistics(&self) -> Result<AggregateResult> {
        let records = self.snapshot()?;
        Ok(aggregate(&records, &self.config.metrics))
    }

    async fn create(&self, mut record: T) -> Result<T> {
        if record.id().trim().is_empty() {
            record.set_id(Uuid::new_v4().to_string());
        }

        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        if records.contains_key(record.id()) {
            return Err(ConsoleError::from(MutationError::Duplicate {
                resource: self.config.resource.clone(),
                id: record.id().to_string(),
            })
            .into());
        }

        records.insert(record.id().to_string(), record.clone());

        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        match records.shift_remove(id) {
            Some(_) => Ok(()),
            None => Err(ConsoleError::NotFound {
                resource: self.config.resource.clone(),
                id: id.to_string(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsoleConfig;
    use crate::core::record::DynamicRecord;
    use serde_json::json;

    fn source() -> InMemorySource<DynamicRecord> {
        let config = ConsoleConfig::default_config().page("buses").unwrap().clone();
        let records = (0..25).map(|i| {
            DynamicRecord::from_json(&json!({
                "id": format!("bus-{:02}", i),
                "plate_number": format!("KA-01-F-{:04}", i),
                "status": if i % 5 == 0 { "maintenance" } else { "active" },
                "bus_type": if i % 2 == 0 { "AC" } else { "Non-AC" },
                "capacity": 30 + i,
            }))
            .unwrap()
        });
        InMemorySource::with_records(config, records)
    }

    #[tokio::test]
    async fn test_list_pages_and_filters() {
        let source = source();
        let mut query = ListQuery {
            size: 10,
            page: 2,
            ..ListQuery::default()
        };
        let page = source.list(&query).await.unwrap();
        assert_eq!(page.content.len(), 5);
        assert_eq!(page.total_pages, 3);

        query.page = 0;
        query.filters.insert("status".into(), "maintenance".into());
        let page = source.list(&query).await.unwrap();
        assert_eq!(page.total_elements, 5);
    }

    #[tokio::test]
    async fn test_out_of_range_page_is_reported_not_clamped() {
        let source = source();
        let query = ListQuery {
            page: 9,
            ..ListQuery::default()
        };
        let page = source.list(&query).await.unwrap();
        assert!(page.content.is_empty());
        assert_eq!(page.number, 9);
        assert!(page.is_out_of_range());
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_rejects_duplicates() {
        let source = source();
        let created = source
            .create(DynamicRecord::new("", IndexMap::new()))
            .await
            .unwrap();
        assert!(Uuid::parse_str(created.id()).is_ok());
        assert_eq!(source.len().unwrap(), 26);

        let err = source.create(created).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConsoleError>(),
            Some(ConsoleError::Mutation(MutationError::Duplicate { .. }))
        ));
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let source = source();
        source.delete("bus-03").await.unwrap();
        assert!(source.get("bus-03").await.unwrap().is_none());

        let err = source.delete("bus-03").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConsoleError>(),
            Some(ConsoleError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_statistics_cover_whole_snapshot() {
        let stats = source().statistics().await.unwrap();
        assert_eq!(stats.metric("total"), 25.0);
        assert_eq!(stats.metric("maintenance"), 5.0);
    }
}
