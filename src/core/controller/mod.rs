//! Per-page query controller
//!
//! A [`QueryController`] owns the filter, sort and page state of one list
//! page, turns state changes into requests against a [`ListSource`], and
//! commits results with last-write-wins semantics. Search and filter inputs
//! are debounced; sort, paging, clearing and explicit refreshes are not.
//!
//! ```text
//! set_search ─┐                         ┌─ Server: ListQuery ──▶ source.list()
//! set_filter ─┴─▶ debounce ─▶ execute ──┤
//! set_sort / set_page ───────▶ execute ─┘─ Client: snapshot ──▶ pipeline::run()
//!                                  │
//!                                  └──▶ reduce(token) ──▶ ViewState
//! ```

pub mod debounce;
pub mod state;

pub use debounce::Debouncer;
pub use state::{ControllerEvent, LoadStatus, ViewState, reduce};

use crate::config::{FilterDefinition, FilterKind, ListMode, MAX_PAGE_SIZE, PageConfig};
use crate::core::aggregate::AggregateResult;
use crate::core::error::{ConfigError, ConsoleError, FetchError, MutationError, ValidationError};
use crate::core::export::{export_filename, to_csv};
use crate::core::filter::{DateWindow, Filter};
use crate::core::pager::PageState;
use crate::core::pipeline::{self, QueryState};
use crate::core::pluralize::Pluralizer;
use crate::core::query::ListQuery;
use crate::core::record::Record;
use crate::core::service::ListSource;
use crate::core::sort::{SortState, sort_records};
use crate::core::validation::Validatable;
use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

fn lock<M>(mutex: &Mutex<M>) -> MutexGuard<'_, M> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A page of results ready to be committed
struct Commit<T> {
    items: Vec<T>,
    page: PageState,
    total_elements: usize,
    total_pages: usize,
    stats: Option<AggregateResult>,
}

struct Inner<T: Record> {
    source: Arc<dyn ListSource<T>>,
    config: PageConfig,
    query: Mutex<QueryState>,
    view: Mutex<ViewState<T>>,
    /// Client-mode snapshot, fetched once and reused until invalidated
    snapshot: Mutex<Option<Arc<Vec<T>>>>,
    tokens: AtomicU64,
    debouncer: Debouncer,
}

/// Cloneable handle to a page's query state
pub struct QueryController<T: Record> {
    inner: Arc<Inner<T>>,
}

impl<T: Record> Clone for QueryController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Record> QueryController<T> {
    pub fn new(source: Arc<dyn ListSource<T>>, config: PageConfig) -> Self {
        let initial = config.initial_state();
        let debouncer = Debouncer::new(config.debounce());
        Self {
            inner: Arc::new(Inner {
                source,
                view: Mutex::new(ViewState::new(initial.page)),
                query: Mutex::new(initial),
                config,
                snapshot: Mutex::new(None),
                tokens: AtomicU64::new(0),
                debouncer,
            }),
        }
    }

    pub fn config(&self) -> &PageConfig {
        &self.inner.config
    }

    fn resource(&self) -> &str {
        &self.inner.config.resource
    }

    /// Current filter, sort and page inputs
    pub fn query_state(&self) -> QueryState {
        lock(&self.inner.query).clone()
    }

    /// What the page currently displays
    pub fn view(&self) -> ViewState<T> {
        lock(&self.inner.view).clone()
    }

    /// Initial load of the list and the secondary panels
    pub async fn load(&self) -> Result<(), ConsoleError> {
        let (list, ()) = futures::join!(self.execute(), self.load_secondary());
        list
    }

    // =========================================================================
    // Debounced inputs
    // =========================================================================

    /// Change the free-text search; the request is debounced
    pub fn set_search(&self, term: impl Into<String>) {
        let term = term.into();
        lock(&self.inner.query).filters.search = term;
        self.schedule_execute();
    }

    /// Set a named filter; the request is debounced
    pub fn set_filter(&self, name: impl Into<String>, filter: Filter) {
        lock(&self.inner.query).filters.filters.insert(name.into(), filter);
        self.schedule_execute();
    }

    /// Set a categorical filter declared by the page (`"all"` clears it)
    pub fn set_categorical(&self, name: &str, value: impl Into<String>) -> Result<(), ConsoleError> {
        let def = self.definition(name, FilterKind::Categorical)?;
        let filter = Filter::categorical(def.field.clone(), value);
        self.set_filter(name, filter);
        Ok(())
    }

    /// Set a numeric range filter declared by the page
    pub fn set_range(&self, name: &str, min: Option<f64>, max: Option<f64>) -> Result<(), ConsoleError> {
        let def = self.definition(name, FilterKind::NumericRange)?;
        let filter = Filter::range(def.field.clone(), min, max);
        self.set_filter(name, filter);
        Ok(())
    }

    /// Set a date window filter declared by the page
    pub fn set_date_window(&self, name: &str, window: DateWindow) -> Result<(), ConsoleError> {
        let def = self.definition(name, FilterKind::DateWindow)?;
        let filter = Filter::date_window(def.field.clone(), window);
        self.set_filter(name, filter);
        Ok(())
    }

    fn definition(&self, name: &str, kind: FilterKind) -> Result<&FilterDefinition, ConsoleError> {
        match self.inner.config.filter_definition(name) {
            Some(def) if def.kind == kind => Ok(def),
            Some(def) => Err(ConfigError::InvalidValue {
                field: format!("{}.filters.{}", self.resource(), name),
                value: format!("{:?}", kind),
                message: format!("filter is declared as {:?}", def.kind),
            }
            .into()),
            None => Err(ConfigError::InvalidValue {
                field: format!("{}.filters", self.resource()),
                value: name.to_string(),
                message: "no such filter on this page".to_string(),
            }
            .into()),
        }
    }

    /// Wait for a pending debounced request to fire and complete
    pub async fn flush(&self) {
        self.inner.debouncer.flush().await;
    }

    fn schedule_execute(&self) {
        let this = self.clone();
        self.inner.debouncer.schedule(async move {
            // Failures are already recorded in the view state and logged.
            let _ = this.execute().await;
        });
    }

    // =========================================================================
    // Immediate inputs
    // =========================================================================

    /// Change the sort order and reload immediately
    pub async fn set_sort(&self, sort: SortState) -> Result<(), ConsoleError> {
        self.inner.debouncer.cancel();
        lock(&self.inner.query).sort = sort;
        self.execute().await
    }

    /// Sort by `field`, flipping the direction when it is already the sort field
    pub async fn toggle_sort(&self, field: &str) -> Result<(), ConsoleError> {
        let next = self.query_state().sort.toggled(field);
        self.set_sort(next).await
    }

    /// Move to another page and reload immediately
    pub async fn set_page(&self, index: usize) -> Result<(), ConsoleError> {
        self.inner.debouncer.cancel();
        {
            let mut query = lock(&self.inner.query);
            query.page = query.page.with_index(index);
        }
        self.execute().await
    }

    /// Change the page size (returning to the first page) and reload
    pub async fn set_page_size(&self, size: usize) -> Result<(), ConsoleError> {
        self.inner.debouncer.cancel();
        {
            let mut query = lock(&self.inner.query);
            query.page = query.page.with_size(size.clamp(1, MAX_PAGE_SIZE));
        }
        self.execute().await
    }

    /// Reset every filter and the search term, keeping sort and page size
    pub async fn clear_filters(&self) -> Result<(), ConsoleError> {
        self.inner.debouncer.cancel();
        lock(&self.inner.query).filters.clear();
        self.execute().await
    }

    /// Explicit retry: refetch the list (and snapshot) plus secondary panels
    pub async fn refresh(&self) -> Result<(), ConsoleError> {
        self.inner.debouncer.cancel();
        self.resync().await
    }

    async fn resync(&self) -> Result<(), ConsoleError> {
        self.invalidate_snapshot();
        let (list, ()) = futures::join!(self.execute(), self.load_secondary());
        list
    }

    // =========================================================================
    // Requests
    // =========================================================================

    async fn execute(&self) -> Result<(), ConsoleError> {
        let token = self.inner.tokens.fetch_add(1, Ordering::SeqCst) + 1;
        reduce(&mut lock(&self.inner.view), ControllerEvent::Requested { token });
        debug!(resource = %self.resource(), token, "list request issued");

        let outcome = match self.inner.config.mode {
            ListMode::Server => self.fetch_server_page().await,
            ListMode::Client => self.compute_client_page().await,
        };

        match outcome {
            Ok(commit) => {
                if !self.commit(token, commit) {
                    debug!(resource = %self.resource(), token, "stale list response dropped");
                }
                Ok(())
            }
            Err(e) => {
                error!(resource = %self.resource(), token, error = %e, "list load failed");
                let err = FetchError::ListFailed {
                    resource: self.resource().to_string(),
                    message: e.to_string(),
                };
                let event = ControllerEvent::Failed {
                    token,
                    message: err.user_message(),
                };
                if reduce(&mut lock(&self.inner.view), event) {
                    Err(err.into())
                } else {
                    debug!(resource = %self.resource(), token, "stale list failure dropped");
                    Ok(())
                }
            }
        }
    }

    fn commit(&self, token: u64, commit: Commit<T>) -> bool {
        let mut view = lock(&self.inner.view);
        let committed = reduce(
            &mut view,
            ControllerEvent::Succeeded {
                token,
                items: commit.items,
                page: commit.page,
                total_elements: commit.total_elements,
                total_pages: commit.total_pages,
            },
        );
        if committed {
            if commit.stats.is_some() {
                view.stats = commit.stats;
            }
            lock(&self.inner.query).page = commit.page;
        }
        committed
    }

    async fn fetch_server_page(&self) -> anyhow::Result<Commit<T>> {
        let state = self.query_state();
        let mut query = ListQuery::from_state(&state, &self.inner.config);
        let mut response = self.inner.source.list(&query).await?;

        if response.is_out_of_range() && query.page > 0 {
            debug!(
                resource = %self.resource(),
                page = query.page,
                total_pages = response.total_pages,
                "page out of range, re-issuing first page"
            );
            query.page = 0;
            response = self.inner.source.list(&query).await?;
        }

        Ok(Commit {
            page: PageState::new(response.number, response.size),
            total_elements: response.total_elements,
            total_pages: response.total_pages,
            items: response.content,
            stats: None,
        })
    }

    async fn compute_client_page(&self) -> anyhow::Result<Commit<T>> {
        let snapshot = self.snapshot().await?;
        let state = self.query_state();
        let config = &self.inner.config;
        let view = pipeline::run(
            &snapshot,
            &state,
            &config.metrics,
            config.stats_scope,
            Utc::now(),
        );

        Ok(Commit {
            total_elements: view.page.total_elements,
            total_pages: view.page.total_pages,
            items: view.page.items,
            page: view.page_state,
            stats: Some(view.stats),
        })
    }

    async fn snapshot(&self) -> anyhow::Result<Arc<Vec<T>>> {
        let cached = lock(&self.inner.snapshot).clone();
        if let Some(snapshot) = cached {
            return Ok(snapshot);
        }
        let records = Arc::new(self.inner.source.fetch_all().await?);
        debug!(resource = %self.resource(), count = records.len(), "snapshot loaded");
        *lock(&self.inner.snapshot) = Some(records.clone());
        Ok(records)
    }

    fn invalidate_snapshot(&self) {
        lock(&self.inner.snapshot).take();
    }

    /// Load statistics and filter options
    ///
    /// Both are independent of the list and may fail without affecting it;
    /// a failure is logged and the panel keeps its previous content. In
    /// client mode statistics come from the local pipeline instead.
    pub async fn load_secondary(&self) {
        let source = &self.inner.source;
        let (stats, options) = match self.inner.config.mode {
            ListMode::Server => {
                let (stats, options) = futures::join!(source.statistics(), source.filter_options());
                (Some(stats), options)
            }
            ListMode::Client => (None, source.filter_options().await),
        };

        if let Some(stats) = stats {
            match stats {
                Ok(stats) => lock(&self.inner.view).stats = Some(stats),
                Err(e) => {
                    let err = FetchError::StatisticsFailed {
                        resource: self.resource().to_string(),
                        message: e.to_string(),
                    };
                    warn!(resource = %self.resource(), error = %err, "statistics unavailable");
                }
            }
        }

        match options {
            Ok(options) => lock(&self.inner.view).filter_options = Some(options),
            Err(e) => {
                let err = FetchError::FilterOptionsFailed {
                    resource: self.resource().to_string(),
                    message: e.to_string(),
                };
                warn!(resource = %self.resource(), error = %err, "filter options unavailable");
            }
        }
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Look up a single record
    pub async fn find(&self, id: &str) -> Result<T, ConsoleError> {
        match self.inner.source.get(id).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(ConsoleError::NotFound {
                resource: self.resource().to_string(),
                id: id.to_string(),
            }),
            Err(e) => {
                error!(resource = %self.resource(), id, error = %e, "record lookup failed");
                Err(FetchError::ListFailed {
                    resource: self.resource().to_string(),
                    message: e.to_string(),
                }
                .into())
            }
        }
    }

    /// Delete a record, then resync the list and statistics
    ///
    /// Displayed state is untouched when the backend rejects the delete.
    pub async fn delete(&self, id: &str) -> Result<(), ConsoleError> {
        if let Err(e) = self.inner.source.delete(id).await {
            let generic = format!(
                "Failed to delete {}. Please try again.",
                Pluralizer::singularize(self.resource())
            );
            let err = mutation_error(e, generic, |message| MutationError::DeleteFailed {
                resource: self.resource().to_string(),
                id: id.to_string(),
                message,
            });
            warn!(resource = %self.resource(), id, error = %err, "delete rejected");
            return Err(err);
        }

        info!(resource = %self.resource(), id, "record deleted, resyncing");
        // The delete succeeded; a failed resync is reflected in the view state.
        let _ = self.resync().await;
        Ok(())
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// CSV of the rows currently displayed, with its download filename
    pub fn export_page_csv(&self, today: NaiveDate) -> (String, String) {
        let csv = to_csv(&lock(&self.inner.view).items);
        (export_filename(self.resource(), today), csv)
    }

    /// CSV of every record, in the current sort order
    pub async fn export_all_csv(&self, today: NaiveDate) -> Result<(String, String), ConsoleError> {
        let records = self.inner.source.fetch_all().await.map_err(|e| {
            error!(resource = %self.resource(), error = %e, "export fetch failed");
            ConsoleError::from(FetchError::ListFailed {
                resource: self.resource().to_string(),
                message: e.to_string(),
            })
        })?;
        let sorted = sort_records(&records, &self.query_state().sort);
        Ok((export_filename(self.resource(), today), to_csv(&sorted)))
    }
}

impl<T> QueryController<T>
where
    T: Record + Validatable + DeserializeOwned,
{
    /// Validate and submit a create form, then resync
    ///
    /// Invalid forms are rejected with every failing field and never reach
    /// the backend.
    pub async fn submit_create(&self, payload: Value) -> Result<T, ConsoleError> {
        let payload = T::form_schema().validate_and_filter(payload)?;
        let record: T = serde_json::from_value(payload).map_err(|e| ValidationError::InvalidJson {
            message: e.to_string(),
        })?;

        let created = self.inner.source.create(record).await.map_err(|e| {
            let generic = format!(
                "Failed to create {}. Please try again.",
                Pluralizer::singularize(self.resource())
            );
            let err = mutation_error(e, generic, |message| MutationError::CreateFailed {
                resource: self.resource().to_string(),
                message,
            });
            warn!(resource = %self.resource(), error = %err, "create rejected");
            err
        })?;

        info!(resource = %self.resource(), id = created.id(), "record created, resyncing");
        let _ = self.resync().await;
        Ok(created)
    }
}

/// Keep typed errors raised by a source and messages the backend sent.
///
/// Anything else becomes `fallback(generic)`; its raw text only reaches the log.
fn mutation_error(
    err: anyhow::Error,
    generic: String,
    fallback: impl FnOnce(String) -> MutationError,
) -> ConsoleError {
    let err = match err.downcast::<ConsoleError>() {
        Ok(
            typed @ (ConsoleError::NotFound { .. }
            | ConsoleError::Mutation(_)
            | ConsoleError::Validation(_)),
        ) => return typed,
        Ok(other) => anyhow::Error::new(other),
        Err(err) => err,
    };

    match backend_message(&err) {
        Some(message) => fallback(message).into(),
        None => {
            warn!(error = %err, "mutation failed without a backend message");
            fallback(generic).into()
        }
    }
}

#[cfg(feature = "http-client")]
fn backend_message(err: &anyhow::Error) -> Option<String> {
    use crate::storage::HttpSourceError;

    match err.downcast_ref::<HttpSourceError>() {
        Some(HttpSourceError::Status { message, .. }) => Some(message.clone()),
        _ => None,
    }
}

#[cfg(not(feature = "http-client"))]
fn backend_message(_err: &anyhow::Error) -> Option<String> {
    None
}
