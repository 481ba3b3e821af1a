//! Page slicing for sorted record lists

use serde::{Deserialize, Serialize};

/// Zero-based page position and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub index: usize,
    pub size: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self { index: 0, size: 10 }
    }
}

impl PageState {
    /// A page state; `size` is raised to at least 1
    pub fn new(index: usize, size: usize) -> Self {
        Self {
            index,
            size: size.max(1),
        }
    }

    /// Change the page size, always returning to the first page
    pub fn with_size(&self, size: usize) -> Self {
        Self::new(0, size)
    }

    /// Move to another page, keeping the size
    pub fn with_index(&self, index: usize) -> Self {
        Self::new(index, self.size)
    }

    /// Reset to the first page when `index` is past the last page for `total` records
    pub fn clamp(&self, total: usize) -> Self {
        if self.index > total_pages_for(total, self.size) - 1 {
            self.with_index(0)
        } else {
            *self
        }
    }

    /// Offset of the first item on this page
    pub fn offset(&self) -> usize {
        self.index.saturating_mul(self.size)
    }
}

/// Number of pages needed for `len` records; never less than 1
pub fn total_pages_for(len: usize, size: usize) -> usize {
    len.div_ceil(size.max(1)).max(1)
}

/// One page of records plus the metadata a table footer needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<R> {
    pub items: Vec<R>,
    pub index: usize,
    pub size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
}

impl<R> Page<R> {
    pub fn has_next(&self) -> bool {
        self.index + 1 < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.index > 0
    }
}

/// Slice `records` into the page described by `state`
///
/// An index past the end yields an empty page; callers that must not show an
/// empty page clamp the state first with [`PageState::clamp`].
pub fn paginate<R: Clone>(records: &[R], state: PageState) -> Page<R> {
    let size = state.size.max(1);
    let start = state.offset().min(records.len());
    let end = start.saturating_add(size).min(records.len());

    Page {
        items: records[start..end].to_vec(),
        index: state.index,
        size,
        total_elements: records.len(),
        total_pages: total_pages_for(records.len(), size),
    }
}
