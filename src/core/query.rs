//! Page windows and remote query descriptions

use crate::core::filter::{MarketTab, SearchCriteria, SortKey};
use crate::core::listing::{Category, Listing};
use serde::{Deserialize, Serialize};

/// Inclusive row range requested from the remote source
///
/// Mirrors the `range(start, end)` contract of hosted table APIs: both ends
/// are included, so a page of 20 starting at row 0 is `0..=19`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    /// Range covering page `page` (0-based) of `page_size` rows
    pub fn for_page(page: usize, page_size: usize) -> Self {
        // Ensure page_size is at least 1 so the range is never inverted
        let page_size = page_size.max(1);
        let start = page * page_size;
        Self {
            start,
            end: start + page_size - 1,
        }
    }

    /// Number of rows covered
    pub fn rows(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Pagination position of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    /// Index of the last page loaded (0-based)
    pub page: usize,

    /// Number of rows requested per page
    pub page_size: usize,

    /// Whether the last fetch returned a full page
    pub has_more: bool,
}

impl PageWindow {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 0,
            page_size: page_size.max(1),
            has_more: false,
        }
    }

    /// Range of the page after the current one
    pub fn next_range(&self) -> PageRange {
        PageRange::for_page(self.page + 1, self.page_size)
    }

    /// A page is considered the last one as soon as it comes back short
    pub fn is_full(&self, fetched: usize) -> bool {
        fetched >= self.page_size
    }
}

/// The part of the criteria a remote source can evaluate itself
///
/// Condition and recency are always applied locally. Plain-text search is
/// only pushed down when no interpretation is active, since keyword
/// matching is broader than a substring match of the raw query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoteQuery {
    pub tab: MarketTab,
    pub category: Option<Category>,
    pub search: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub hide_sold: bool,
    pub sort: SortKey,
}

impl RemoteQuery {
    pub fn from_criteria(criteria: &SearchCriteria) -> Self {
        let filter = &criteria.filter;
        let search = if criteria.uses_plain_text() {
            filter.search_text().map(str::to_string)
        } else {
            None
        };

        Self {
            tab: filter.tab,
            category: filter.category.category(),
            search,
            min_price: filter.min_price,
            max_price: filter.max_price,
            hide_sold: filter.hide_sold,
            sort: filter.sort,
        }
    }
}

/// One page of rows returned by a remote source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage {
    pub records: Vec<Listing>,

    /// Total rows matching the remote filter, when the source counts them
    pub total: Option<usize>,
}

impl ListingPage {
    pub fn new(records: Vec<Listing>) -> Self {
        Self {
            records,
            total: None,
        }
    }
}
