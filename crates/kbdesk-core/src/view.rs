//! Document collection view: filtering, pagination, and page-scoped selection.
//!
//! [`project`] is a pure function of the collection, the [`ViewParams`], and
//! the selection. Parameter transitions live on [`ViewParams`] itself so the
//! page resets are applied the same way everywhere; callers pair each
//! transition with clearing the selection.

use std::num::NonZeroUsize;

use crate::collection::SelectionSet;
use crate::defaults;
use crate::models::{Document, DocumentId};

/// Page size, or everything on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemsPerPage {
    Count(NonZeroUsize),
    All,
}

impl ItemsPerPage {
    /// `None` for zero.
    pub fn count(n: usize) -> Option<Self> {
        NonZeroUsize::new(n).map(Self::Count)
    }
}

impl Default for ItemsPerPage {
    fn default() -> Self {
        NonZeroUsize::new(defaults::ITEMS_PER_PAGE)
            .map(Self::Count)
            .unwrap_or(Self::All)
    }
}

/// Immutable view parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewParams {
    filter_term: String,
    items_per_page: ItemsPerPage,
    current_page: usize,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            filter_term: String::new(),
            items_per_page: ItemsPerPage::default(),
            current_page: 1,
        }
    }
}

impl ViewParams {
    pub fn new(items_per_page: ItemsPerPage) -> Self {
        Self {
            items_per_page,
            ..Self::default()
        }
    }

    pub fn filter_term(&self) -> &str {
        &self.filter_term
    }

    pub fn items_per_page(&self) -> ItemsPerPage {
        self.items_per_page
    }

    /// 1-based.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// New filter term; back to page 1.
    pub fn with_filter(&self, term: impl Into<String>) -> Self {
        Self {
            filter_term: term.into(),
            items_per_page: self.items_per_page,
            current_page: 1,
        }
    }

    /// New page size; back to page 1.
    pub fn with_items_per_page(&self, items_per_page: ItemsPerPage) -> Self {
        Self {
            filter_term: self.filter_term.clone(),
            items_per_page,
            current_page: 1,
        }
    }

    /// Jump to `page` (pages below 1 are treated as 1).
    pub fn with_page(&self, page: usize) -> Self {
        Self {
            filter_term: self.filter_term.clone(),
            items_per_page: self.items_per_page,
            current_page: page.max(1),
        }
    }
}

/// State of the "select all" checkbox for the visible page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAllState {
    None,
    Partial,
    All,
}

/// Derived rendering state for one set of inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView<'a> {
    /// Documents matching the filter, in collection order.
    pub filtered: Vec<&'a Document>,
    pub total_pages: usize,
    /// Requested page clamped into `1..=max(total_pages, 1)`.
    pub current_page: usize,
    pub items_per_page: ItemsPerPage,
    /// Slice bounds into `filtered`.
    pub start: usize,
    pub end: usize,
    pub select_all: SelectAllState,
}

impl<'a> PageView<'a> {
    /// Documents rendered on the current page.
    pub fn page_slice(&self) -> &[&'a Document] {
        &self.filtered[self.start..self.end]
    }

    pub fn page_ids(&self) -> Vec<DocumentId> {
        self.page_slice().iter().map(|d| d.id.clone()).collect()
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Whether the pager control should be rendered at all.
    pub fn shows_pager(&self) -> bool {
        self.total_pages > 1 && self.items_per_page != ItemsPerPage::All
    }

    /// Page buttons for the pager control.
    pub fn page_numbers(&self) -> Vec<usize> {
        page_numbers(self.current_page, self.total_pages)
    }

    /// `Showing 6-10 of 12 documents`, `Showing all 12 documents`.
    pub fn range_label(&self) -> String {
        let total = self.filtered.len();
        if total == 0 {
            return "No documents found".to_string();
        }
        match self.items_per_page {
            ItemsPerPage::All => format!("Showing all {} documents", total),
            ItemsPerPage::Count(_) => {
                format!("Showing {}-{} of {} documents", self.start + 1, self.end, total)
            }
        }
    }
}

/// Case-insensitive substring match on the document name.
pub fn matches_filter(document: &Document, filter_term: &str) -> bool {
    filter_term.is_empty()
        || document
            .name
            .to_lowercase()
            .contains(&filter_term.to_lowercase())
}

/// Project the collection through the view parameters.
pub fn project<'a>(
    documents: &'a [Document],
    params: &ViewParams,
    selection: &SelectionSet,
) -> PageView<'a> {
    let filtered: Vec<&Document> = documents
        .iter()
        .filter(|d| matches_filter(d, &params.filter_term))
        .collect();
    let count = filtered.len();

    let (total_pages, current_page, start, end) = match params.items_per_page {
        ItemsPerPage::All => (1, 1, 0, count),
        ItemsPerPage::Count(per_page) => {
            let per_page = per_page.get();
            let total_pages = count.div_ceil(per_page);
            let current_page = params.current_page.clamp(1, total_pages.max(1));
            let start = ((current_page - 1) * per_page).min(count);
            let end = (start + per_page).min(count);
            (total_pages, current_page, start, end)
        }
    };

    let slice = &filtered[start..end];
    let selected_on_page = slice
        .iter()
        .filter(|d| selection.contains(&d.id))
        .count();
    let select_all = if slice.is_empty() || selected_on_page == 0 {
        SelectAllState::None
    } else if selected_on_page == slice.len() {
        SelectAllState::All
    } else {
        SelectAllState::Partial
    };

    PageView {
        filtered,
        total_pages,
        current_page,
        items_per_page: params.items_per_page,
        start,
        end,
        select_all,
    }
}

/// At most [`defaults::PAGER_WINDOW`] page numbers centred on `current`,
/// clamped to the first or last window at the ends of the range.
pub fn page_numbers(current: usize, total: usize) -> Vec<usize> {
    let window = defaults::PAGER_WINDOW;
    let half = window / 2;
    if total <= window {
        return (1..=total).collect();
    }
    let first = if current <= half + 1 {
        1
    } else if current + half >= total {
        total - window + 1
    } else {
        current - half
    };
    (first..first + window).collect()
}
