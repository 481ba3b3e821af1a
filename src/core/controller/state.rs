//! Displayed state of a list page and the reducer that advances it
//!
//! Every list request carries a token. A response is committed only when its
//! token is still the latest one issued, so a slow stale response can never
//! overwrite newer state.

use crate::core::aggregate::AggregateResult;
use crate::core::pager::PageState;
use crate::core::query::FilterOptions;

/// Loading state of the primary list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    /// The latest request failed; `message` is safe to show to users
    Error { message: String },
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoadStatus::Error { .. })
    }
}

/// What a page currently displays
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<T> {
    pub status: LoadStatus,
    /// Rows of the committed page
    pub items: Vec<T>,
    /// Committed page position
    pub page: PageState,
    pub total_elements: usize,
    pub total_pages: usize,
    /// Token of the most recent request issued
    pub latest_token: u64,
    /// Whether any list response was ever committed
    pub loaded: bool,
    /// Stat cards; `None` until loaded or when unavailable
    pub stats: Option<AggregateResult>,
    /// Filter dropdown choices; `None` until loaded or when unavailable
    pub filter_options: Option<FilterOptions>,
}

impl<T> ViewState<T> {
    pub fn new(page: PageState) -> Self {
        Self {
            status: LoadStatus::Idle,
            items: Vec::new(),
            page,
            total_elements: 0,
            total_pages: 1,
            latest_token: 0,
            loaded: false,
            stats: None,
            filter_options: None,
        }
    }
}

/// A state transition of the primary list
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent<T> {
    /// A request with `token` was issued
    Requested { token: u64 },

    /// The request with `token` returned a page
    Succeeded {
        token: u64,
        items: Vec<T>,
        page: PageState,
        total_elements: usize,
        total_pages: usize,
    },

    /// The request with `token` failed
    Failed { token: u64, message: String },
}

impl<T> ControllerEvent<T> {
    pub fn token(&self) -> u64 {
        match self {
            ControllerEvent::Requested { token }
            | ControllerEvent::Succeeded { token, .. }
            | ControllerEvent::Failed { token, .. } => *token,
        }
    }
}

/// Apply `event` to `state`, returning whether it was committed
///
/// - `Requested` with a newer token switches to `Loading` and keeps the
///   previous rows on screen.
/// - `Succeeded` with the latest token replaces the rows and returns to
///   `Idle`.
/// - `Failed` with the latest token enters `Error`. Rows from an earlier
///   successful load stay visible; a failed first load shows none.
/// - Anything carrying an older token is dropped.
pub fn reduce<T>(state: &mut ViewState<T>, event: ControllerEvent<T>) -> bool {
    match event {
        ControllerEvent::Requested { token } => {
            if token <= state.latest_token {
                return false;
            }
            state.latest_token = token;
            state.status = LoadStatus::Loading;
            true
        }
        ControllerEvent::Succeeded {
            token,
            items,
            page,
            total_elements,
            total_pages,
        } => {
            if token != state.latest_token {
                return false;
            }
            state.items = items;
            state.page = page;
            state.total_elements = total_elements;
            state.total_pages = total_pages.max(1);
            state.status = LoadStatus::Idle;
            state.loaded = true;
            true
        }
        ControllerEvent::Failed { token, message } => {
            if token != state.latest_token {
                return false;
            }
            if !state.loaded {
                state.items.clear();
                state.total_elements = 0;
                state.total_pages = 1;
            }
            state.status = LoadStatus::Error { message };
            true
        }
    }
}
