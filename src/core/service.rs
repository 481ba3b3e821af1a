//! Backend collaborator trait for list pages

use crate::core::aggregate::AggregateResult;
use crate::core::query::{FilterOptions, ListQuery, ListResponse};
use crate::core::record::Record;
use anyhow::Result;
use async_trait::async_trait;

/// Source of records for one console page
///
/// Implementations may be an in-process store or a remote REST backend.
/// The query controller is agnostic to which one it talks to.
#[async_trait]
pub trait ListSource<T: Record>: Send + Sync {
    /// Run a server-paginated query
    async fn list(&self, query: &ListQuery) -> Result<ListResponse<T>>;

    /// Fetch every record (client-mode snapshot, "export all")
    async fn fetch_all(&self) -> Result<Vec<T>>;

    /// Get a record by id
    async fn get(&self, id: &str) -> Result<Option<T>>;

    /// Valid values for the page's filter controls
    async fn filter_options(&self) -> Result<FilterOptions>;

    /// Summary statistics for the stat cards
    async fn statistics(&self) -> Result<AggregateResult>;

    /// Create a new record, returning it as stored
    async fn create(&self, record: T) -> Result<T>;

    /// Delete a record
    async fn delete(&self, id: &str) -> Result<()>;
}
