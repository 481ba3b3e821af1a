//! Core module containing the list query pipeline and its collaborators

pub mod aggregate;
pub mod controller;
pub mod error;
pub mod export;
pub mod field;
pub mod filter;
pub mod pager;
pub mod pipeline;
pub mod pluralize;
pub mod query;
pub mod record;
pub mod service;
pub mod sort;
pub mod validation;

pub use aggregate::{AggregateResult, MetricSpec, aggregate};
pub use controller::{LoadStatus, QueryController, ViewState};
pub use error::{ConsoleError, ErrorResponse};
pub use field::{FieldValue, ToFieldValue};
pub use filter::{DateWindow, Filter, FilterState};
pub use pager::{Page, PageState, paginate};
pub use pipeline::{QueryState, QueryView};
pub use query::{FilterOptions, ListQuery, ListResponse};
pub use record::{DynamicRecord, Record};
pub use service::ListSource;
pub use sort::{SortDirection, SortState};
pub use validation::{FormSchema, Validatable};
