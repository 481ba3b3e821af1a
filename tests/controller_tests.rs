//! Query controller behavior against a scripted backend

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use transit::config::{ConsoleConfig, ListMode, PageConfig};
use transit::core::aggregate::AggregateResult;
use transit::core::controller::{LoadStatus, QueryController};
use transit::core::error::{ConsoleError, MutationError, ValidationError};
use transit::core::query::{FilterOptions, ListQuery, ListResponse};
use transit::core::record::Record;
use transit::core::service::ListSource;
use transit::core::sort::SortState;
use transit::entities::Bus;
use transit::storage::InMemorySource;

// ============================================================================
// Scripted source
// ============================================================================

struct ScriptedSource {
    inner: InMemorySource<Bus>,
    list_calls: Mutex<Vec<ListQuery>>,
    fetch_all_calls: AtomicUsize,
    create_calls: AtomicUsize,
    fail_list: AtomicBool,
    fail_statistics: AtomicBool,
    reject_delete: AtomicBool,
    /// Mutations fail below the application layer, with no backend message
    fail_mutations: AtomicBool,
    /// Page index whose list response is held back
    slow_page: Mutex<Option<(usize, Duration)>>,
}

impl ScriptedSource {
    fn new(page: PageConfig) -> Self {
        Self {
            inner: InMemorySource::with_records(page, fleet()),
            list_calls: Mutex::new(Vec::new()),
            fetch_all_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            fail_list: AtomicBool::new(false),
            fail_statistics: AtomicBool::new(false),
            reject_delete: AtomicBool::new(false),
            fail_mutations: AtomicBool::new(false),
            slow_page: Mutex::new(None),
        }
    }

    fn list_calls(&self) -> Vec<ListQuery> {
        self.list_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListSource<Bus> for ScriptedSource {
    async fn list(&self, query: &ListQuery) -> Result<ListResponse<Bus>> {
        self.list_calls.lock().unwrap().push(query.clone());
        let delay = match *self.slow_page.lock().unwrap() {
            Some((page, delay)) if page == query.page => Some(delay),
            _ => None,
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(anyhow!("connection reset by peer (os error 104)"));
        }
        self.inner.list(query).await
    }

    async fn fetch_all(&self) -> Result<Vec<Bus>> {
        self.fetch_all_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(anyhow!("gateway timeout"));
        }
        self.inner.fetch_all().await
    }

    async fn get(&self, id: &str) -> Result<Option<Bus>> {
        self.inner.get(id).await
    }

    async fn filter_options(&self) -> Result<FilterOptions> {
        self.inner.filter_options().await
    }

    async fn statistics(&self) -> Result<AggregateResult> {
        if self.fail_statistics.load(Ordering::SeqCst) {
            return Err(anyhow!("statistics service unavailable"));
        }
        self.inner.statistics().await
    }

    async fn create(&self, record: Bus) -> Result<Bus> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(anyhow!(
                "request to http://10.0.3.7:8080/api/buses failed: connection refused (os error 111)"
            ));
        }
        self.inner.create(record).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(anyhow!(
                "request to http://10.0.3.7:8080/api/buses/{id} failed: connection refused (os error 111)"
            ));
        }
        if self.reject_delete.load(Ordering::SeqCst) {
            return Err(ConsoleError::from(MutationError::DeleteFailed {
                resource: "buses".to_string(),
                id: id.to_string(),
                message: "Bus is assigned to an active schedule".to_string(),
            })
            .into());
        }
        self.inner.delete(id).await
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// 25 buses: ten KA plates then fifteen MH plates, every fifth in maintenance
fn fleet() -> Vec<Bus> {
    let registered = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
    (0..25)
        .map(|i| {
            let plate = if i < 10 {
                format!("KA-01-F-{:04}", i)
            } else {
                format!("MH-12-A-{:04}", i)
            };
            Bus::new(
                format!("bus-{:03}", i),
                plate,
                if i % 2 == 0 { "AC" } else { "Non-AC" }.to_string(),
                if i % 5 == 0 { "maintenance" } else { "active" }.to_string(),
                30 + i as i64,
                "City Lines".to_string(),
                None,
                registered,
            )
        })
        .collect()
}

fn buses_page() -> PageConfig {
    ConsoleConfig::default_config().page("buses").unwrap().clone()
}

fn setup(page: PageConfig) -> (Arc<ScriptedSource>, QueryController<Bus>) {
    let source = Arc::new(ScriptedSource::new(page.clone()));
    let controller = QueryController::new(source.clone(), page);
    (source, controller)
}

fn valid_form() -> serde_json::Value {
    json!({
        "plateNumber": " ka-05-mx-7777 ",
        "busType": "Electric",
        "status": "active",
        "capacity": "48",
        "operatorName": "City Lines",
        "registeredAt": "2024-03-01T08:00:00Z",
    })
}

// ============================================================================
// Debounce and request ordering
// ============================================================================

mod debounce {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_search_burst_issues_one_request_with_final_term() {
        let (source, controller) = setup(buses_page());

        controller.set_search("KA");
        tokio::time::sleep(Duration::from_millis(50)).await;
        controller.set_search("KA-01");
        controller.flush().await;

        let calls = source.list_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].search.as_deref(), Some("KA-01"));

        let view = controller.view();
        assert_eq!(view.status, LoadStatus::Idle);
        assert_eq!(view.total_elements, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_is_sent_before_the_quiet_period() {
        let (source, controller) = setup(buses_page());

        controller.set_search("MH");
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(source.list_calls().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(source.list_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sort_change_runs_immediately_and_absorbs_pending_search() {
        let (source, controller) = setup(buses_page());

        controller.set_search("MH");
        controller.set_sort(SortState::desc("capacity")).await.unwrap();

        let calls = source.list_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].search.as_deref(), Some("MH"));
        assert_eq!(calls[0].sort_by, "capacity");

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.list_calls().len(), 1);
        assert_eq!(controller.view().items[0].capacity, 54);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_never_overwrites_newer_page() {
        let (source, controller) = setup(buses_page());
        *source.slow_page.lock().unwrap() = Some((1, Duration::from_millis(500)));

        let slow = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.set_page(1).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        controller.set_page(2).await.unwrap();
        slow.await.unwrap().unwrap();

        let view = controller.view();
        assert_eq!(view.page.index, 2);
        assert_eq!(view.items.len(), 5);
        assert_eq!(view.items[0].id, "bus-020");
        assert_eq!(controller.query_state().page.index, 2);
        assert_eq!(source.list_calls().len(), 2);
    }
}

// ============================================================================
// Server mode
// ============================================================================

mod server_mode {
    use super::*;

    #[tokio::test]
    async fn test_load_fills_list_stats_and_options() {
        let (_source, controller) = setup(buses_page());
        controller.load().await.unwrap();

        let view = controller.view();
        assert!(view.loaded);
        assert_eq!(view.items.len(), 10);
        assert_eq!(view.total_elements, 25);
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.items[0].plate_number, "KA-01-F-0000");

        let stats = view.stats.unwrap();
        assert_eq!(stats.metric("total"), 25.0);
        assert_eq!(stats.metric("maintenance"), 5.0);

        let options = view.filter_options.unwrap();
        assert_eq!(options.categorical["status"], vec!["active", "maintenance"]);
    }

    #[tokio::test]
    async fn test_filters_are_sent_by_filter_name() {
        let (source, controller) = setup(buses_page());
        controller.set_categorical("busType", "AC").unwrap();
        controller.set_range("capacity", Some(40.0), None).unwrap();
        controller.flush().await;

        let calls = source.list_calls();
        let query = calls.last().unwrap();
        assert_eq!(query.filters.get("busType").map(String::as_str), Some("AC"));
        assert_eq!(query.filters.get("capacityMin").map(String::as_str), Some("40"));
        assert!(!query.filters.contains_key("capacityMax"));
        // buses 10, 12, .. 24
        assert_eq!(controller.view().total_elements, 8);
    }

    #[tokio::test]
    async fn test_out_of_range_page_is_reissued_at_first_page() {
        let (source, controller) = setup(buses_page());
        controller.set_page(7).await.unwrap();

        let pages: Vec<usize> = source.list_calls().iter().map(|q| q.page).collect();
        assert_eq!(pages, vec![7, 0]);

        let view = controller.view();
        assert_eq!(view.page.index, 0);
        assert_eq!(view.items.len(), 10);
        assert_eq!(controller.query_state().page.index, 0);
    }

    #[tokio::test]
    async fn test_toggle_sort_flips_direction() {
        let (_source, controller) = setup(buses_page());

        controller.toggle_sort("capacity").await.unwrap();
        assert_eq!(controller.query_state().sort, SortState::asc("capacity"));
        assert_eq!(controller.view().items[0].capacity, 30);

        controller.toggle_sort("capacity").await.unwrap();
        assert_eq!(controller.query_state().sort, SortState::desc("capacity"));
        assert_eq!(controller.view().items[0].capacity, 54);
    }

    #[tokio::test]
    async fn test_page_size_change_returns_to_first_page() {
        let (source, controller) = setup(buses_page());
        controller.set_page(2).await.unwrap();
        controller.set_page_size(5).await.unwrap();

        let last = source.list_calls().pop().unwrap();
        assert_eq!((last.page, last.size), (0, 5));
        assert_eq!(controller.view().total_pages, 5);
    }

    #[tokio::test]
    async fn test_clear_filters_keeps_sort() {
        let (source, controller) = setup(buses_page());
        controller.set_sort(SortState::desc("capacity")).await.unwrap();
        controller.set_categorical("status", "maintenance").unwrap();
        controller.flush().await;
        assert_eq!(controller.view().total_elements, 5);

        controller.clear_filters().await.unwrap();
        let last = source.list_calls().pop().unwrap();
        assert!(last.filters.is_empty());
        assert_eq!(last.sort_by, "capacity");
        assert_eq!(controller.view().total_elements, 25);
    }

    #[tokio::test]
    async fn test_undeclared_filter_is_rejected() {
        let (source, controller) = setup(buses_page());

        let err = controller.set_range("fare", Some(1.0), None).unwrap_err();
        assert!(matches!(err, ConsoleError::Config(_)));

        let err = controller.set_range("status", Some(1.0), None).unwrap_err();
        assert!(matches!(err, ConsoleError::Config(_)));

        controller.flush().await;
        assert!(source.list_calls().is_empty());
    }
}

// ============================================================================
// Failures
// ============================================================================

mod failures {
    use super::*;

    #[tokio::test]
    async fn test_failed_first_load_shows_generic_message_and_retry_recovers() {
        let (source, controller) = setup(buses_page());
        source.fail_list.store(true, Ordering::SeqCst);

        let err = controller.load().await.unwrap_err();
        assert!(matches!(err, ConsoleError::Fetch(_)));

        let view = controller.view();
        assert_eq!(
            view.status,
            LoadStatus::Error {
                message: "Failed to load buses. Please try again.".to_string()
            }
        );
        assert!(view.items.is_empty());
        assert!(!view.loaded);

        source.fail_list.store(false, Ordering::SeqCst);
        controller.refresh().await.unwrap();

        let view = controller.view();
        assert_eq!(view.status, LoadStatus::Idle);
        assert_eq!(view.items.len(), 10);
    }

    #[tokio::test]
    async fn test_failure_after_success_keeps_previous_rows() {
        let (source, controller) = setup(buses_page());
        controller.load().await.unwrap();
        let before = controller.view().items;

        source.fail_list.store(true, Ordering::SeqCst);
        assert!(controller.set_page(1).await.is_err());

        let view = controller.view();
        assert!(view.status.is_error());
        assert_eq!(view.items, before);
    }

    #[tokio::test]
    async fn test_statistics_failure_does_not_affect_list() {
        let (source, controller) = setup(buses_page());
        source.fail_statistics.store(true, Ordering::SeqCst);

        controller.load().await.unwrap();

        let view = controller.view();
        assert_eq!(view.status, LoadStatus::Idle);
        assert_eq!(view.items.len(), 10);
        assert!(view.stats.is_none());
        assert!(view.filter_options.is_some());
    }
}

// ============================================================================
// Records
// ============================================================================

mod records {
    use super::*;

    #[tokio::test]
    async fn test_delete_resyncs_list_and_statistics() {
        let (_source, controller) = setup(buses_page());
        controller.load().await.unwrap();

        controller.delete("bus-003").await.unwrap();

        let view = controller.view();
        assert_eq!(view.total_elements, 24);
        assert_eq!(view.stats.unwrap().metric("total"), 24.0);
        assert!(view.items.iter().all(|b| b.id != "bus-003"));
    }

    #[tokio::test]
    async fn test_rejected_delete_leaves_view_untouched() {
        let (source, controller) = setup(buses_page());
        controller.load().await.unwrap();
        let before = controller.view();
        let calls = source.list_calls().len();

        source.reject_delete.store(true, Ordering::SeqCst);
        let err = controller.delete("bus-003").await.unwrap_err();

        assert!(matches!(
            err,
            ConsoleError::Mutation(MutationError::DeleteFailed { .. })
        ));
        assert_eq!(err.user_message(), "Bus is assigned to an active schedule");
        assert_eq!(controller.view(), before);
        assert_eq!(source.list_calls().len(), calls);
    }

    #[tokio::test]
    async fn test_transport_failure_shows_generic_message() {
        let (source, controller) = setup(buses_page());
        controller.load().await.unwrap();
        let before = controller.view();
        source.fail_mutations.store(true, Ordering::SeqCst);

        let err = controller.delete("bus-003").await.unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::Mutation(MutationError::DeleteFailed { .. })
        ));
        assert_eq!(err.user_message(), "Failed to delete bus. Please try again.");
        assert!(!err.to_string().contains("10.0.3.7"));
        assert_eq!(controller.view(), before);

        let err = controller.submit_create(valid_form()).await.unwrap_err();
        assert_eq!(err.user_message(), "Failed to create bus. Please try again.");
        assert!(!err.user_message().contains("os error"));
    }

    #[tokio::test]
    async fn test_delete_unknown_record_is_not_found() {
        let (_source, controller) = setup(buses_page());
        let err = controller.delete("bus-999").await.unwrap_err();
        assert!(matches!(err, ConsoleError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_invalid_create_never_reaches_backend() {
        let (source, controller) = setup(buses_page());
        let form = json!({
            "plateNumber": "not a plate",
            "busType": "Hovercraft",
            "status": "active",
            "capacity": "0",
            "operatorName": "",
            "registeredAt": "2024-03-01T08:00:00Z",
        });

        let err = controller.submit_create(form).await.unwrap_err();
        let ConsoleError::Validation(validation) = err else {
            panic!("expected a validation error, got {err:?}");
        };
        let fields: Vec<String> = validation.field_errors().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"plateNumber".to_string()));
        assert!(fields.contains(&"busType".to_string()));
        assert!(fields.contains(&"capacity".to_string()));
        assert!(fields.contains(&"operatorName".to_string()));
        assert!(!fields.contains(&"status".to_string()));

        assert_eq!(source.create_calls.load(Ordering::SeqCst), 0);
        assert!(source.list_calls().is_empty());
    }

    #[tokio::test]
    async fn test_valid_create_is_normalized_and_resynced() {
        let (source, controller) = setup(buses_page());
        controller.load().await.unwrap();

        let created = controller.submit_create(valid_form()).await.unwrap();
        assert_eq!(created.plate_number, "KA-05-MX-7777");
        assert_eq!(created.capacity, 48);
        assert!(!created.id.is_empty());
        assert_eq!(source.create_calls.load(Ordering::SeqCst), 1);

        let view = controller.view();
        assert_eq!(view.total_elements, 26);
        assert_eq!(view.stats.unwrap().metric("total"), 26.0);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_invalid_json() {
        let (_source, controller) = setup(buses_page());
        let err = controller.submit_create(json!(["not", "a", "form"])).await.unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::Validation(ValidationError::InvalidJson { .. })
        ));
    }

    #[tokio::test]
    async fn test_find() {
        let (_source, controller) = setup(buses_page());
        let bus = controller.find("bus-004").await.unwrap();
        assert_eq!(bus.plate_number, "KA-01-F-0004");

        let err = controller.find("bus-404").await.unwrap_err();
        assert!(matches!(err, ConsoleError::NotFound { .. }));
        assert_eq!(err.user_message(), "The requested bus could not be found.");
    }

    #[tokio::test]
    async fn test_export_page_and_all() {
        let (_source, controller) = setup(buses_page());
        controller.set_sort(SortState::desc("capacity")).await.unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

        let (filename, csv) = controller.export_page_csv(today);
        assert_eq!(filename, "buses_2024-03-15.csv");
        assert_eq!(csv.lines().count(), 11);
        assert!(csv.starts_with("\"id\",\"plate_number\""));

        let (filename, csv) = controller.export_all_csv(today).await.unwrap();
        assert_eq!(filename, "buses_2024-03-15.csv");
        assert_eq!(csv.lines().count(), 26);
        assert!(csv.lines().nth(1).unwrap().starts_with("\"bus-024\""));
    }
}

// ============================================================================
// Client mode
// ============================================================================

mod client_mode {
    use super::*;

    fn client_page() -> PageConfig {
        buses_page().with_mode(ListMode::Client)
    }

    #[tokio::test]
    async fn test_snapshot_is_fetched_once_and_filtered_locally() {
        let (source, controller) = setup(client_page());
        controller.load().await.unwrap();
        assert_eq!(source.fetch_all_calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.view().total_elements, 25);

        controller.set_categorical("status", "maintenance").unwrap();
        controller.flush().await;

        let view = controller.view();
        assert_eq!(view.total_elements, 5);
        assert_eq!(view.stats.as_ref().unwrap().metric("total"), 5.0);
        assert_eq!(source.fetch_all_calls.load(Ordering::SeqCst), 1);
        assert!(source.list_calls().is_empty());
    }

    #[tokio::test]
    async fn test_narrowing_filter_clamps_page_index() {
        let (_source, controller) = setup(client_page());
        controller.set_page(2).await.unwrap();
        assert_eq!(controller.view().page.index, 2);

        controller.set_categorical("status", "maintenance").unwrap();
        controller.flush().await;

        let view = controller.view();
        assert_eq!(view.page.index, 0);
        assert_eq!(view.items.len(), 5);
        assert_eq!(controller.query_state().page.index, 0);
    }

    #[tokio::test]
    async fn test_refresh_reloads_snapshot() {
        let (source, controller) = setup(client_page());
        controller.load().await.unwrap();
        controller.refresh().await.unwrap();
        assert_eq!(source.fetch_all_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_delete_invalidates_snapshot() {
        let (source, controller) = setup(client_page());
        controller.load().await.unwrap();

        controller.delete("bus-000").await.unwrap();

        assert_eq!(source.fetch_all_calls.load(Ordering::SeqCst), 2);
        let view = controller.view();
        assert_eq!(view.total_elements, 24);
        assert!(view.items.iter().all(|b| b.id() != "bus-000"));
    }
}
