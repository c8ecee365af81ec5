//! Filter state, partial updates and search criteria

use crate::core::listing::{Category, Condition};
use chrono::Duration;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Which side of the market is being browsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketTab {
    /// Sell-offers (`wanted == false`)
    #[default]
    Selling,
    /// Buy-requests (`wanted == true`)
    Wanted,
}

impl MarketTab {
    pub fn wants_wanted(&self) -> bool {
        matches!(self, MarketTab::Wanted)
    }
}

/// Category selector: every category or exactly one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySelector {
    #[default]
    All,
    Only(Category),
}

impl CategorySelector {
    pub fn category(&self) -> Option<Category> {
        match self {
            CategorySelector::All => None,
            CategorySelector::Only(c) => Some(*c),
        }
    }
}

impl From<Category> for CategorySelector {
    fn from(category: Category) -> Self {
        CategorySelector::Only(category)
    }
}

/// Sort key chosen by the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
}

/// How far back a listing may have been posted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecencyWindow {
    Day,
    Week,
    Month,
    #[default]
    All,
}

impl RecencyWindow {
    /// Width of the window, `None` for [`RecencyWindow::All`]
    pub fn duration(&self) -> Option<Duration> {
        match self {
            RecencyWindow::Day => Some(Duration::hours(24)),
            RecencyWindow::Week => Some(Duration::days(7)),
            RecencyWindow::Month => Some(Duration::days(30)),
            RecencyWindow::All => None,
        }
    }
}

/// Complete filter state
///
/// A plain value: every interaction produces a new `FilterState` through
/// [`FilterState::apply`], the old one is never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub tab: MarketTab,
    pub category: CategorySelector,
    pub search: String,
    pub sort: SortKey,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub condition: Option<Condition>,
    pub recency: RecencyWindow,
    pub hide_sold: bool,
}

impl FilterState {
    /// Merge a partial change, returning the resulting state
    pub fn apply(&self, patch: &FilterPatch) -> FilterState {
        FilterState {
            tab: patch.tab.unwrap_or(self.tab),
            category: patch.category.unwrap_or(self.category),
            search: patch
                .search
                .clone()
                .unwrap_or_else(|| self.search.clone()),
            sort: patch.sort.unwrap_or(self.sort),
            min_price: patch.min_price.unwrap_or(self.min_price),
            max_price: patch.max_price.unwrap_or(self.max_price),
            condition: patch.condition.unwrap_or(self.condition),
            recency: patch.recency.unwrap_or(self.recency),
            hide_sold: patch.hide_sold.unwrap_or(self.hide_sold),
        }
    }

    /// Search text trimmed, `None` when blank
    pub fn search_text(&self) -> Option<&str> {
        let trimmed = self.search.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// Partial filter change
///
/// `None` leaves a field untouched. Price bounds and condition are doubly
/// optional so a patch can clear them (`Some(None)`).
///
/// # Example
///
/// ```rust,ignore
/// let patch = FilterPatch::default()
///     .category(Category::Textbook)
///     .sort(SortKey::PriceAsc)
///     .min_price_text("100,000")
///     .hide_sold(true);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub tab: Option<MarketTab>,
    pub category: Option<CategorySelector>,
    pub search: Option<String>,
    pub sort: Option<SortKey>,
    pub min_price: Option<Option<u64>>,
    pub max_price: Option<Option<u64>>,
    pub condition: Option<Option<Condition>>,
    pub recency: Option<RecencyWindow>,
    pub hide_sold: Option<bool>,
}

impl FilterPatch {
    pub fn tab(mut self, tab: MarketTab) -> Self {
        self.tab = Some(tab);
        self
    }

    pub fn category(mut self, category: impl Into<CategorySelector>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn all_categories(mut self) -> Self {
        self.category = Some(CategorySelector::All);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn sort(mut self, sort: SortKey) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn min_price(mut self, bound: Option<u64>) -> Self {
        self.min_price = Some(bound);
        self
    }

    pub fn max_price(mut self, bound: Option<u64>) -> Self {
        self.max_price = Some(bound);
        self
    }

    /// Set the lower bound from raw user input; unparsable text clears it
    pub fn min_price_text(self, input: &str) -> Self {
        self.min_price(parse_price_bound(input))
    }

    /// Set the upper bound from raw user input; unparsable text clears it
    pub fn max_price_text(self, input: &str) -> Self {
        self.max_price(parse_price_bound(input))
    }

    pub fn condition(mut self, condition: Option<Condition>) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn recency(mut self, recency: RecencyWindow) -> Self {
        self.recency = Some(recency);
        self
    }

    pub fn hide_sold(mut self, hide: bool) -> Self {
        self.hide_sold = Some(hide);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == FilterPatch::default()
    }
}

/// Parse a price bound typed by a user
///
/// Accepts plain digits or digits grouped by thousands with `,`, `.`,
/// `_` or a space. Anything else (negative numbers, decimals, words,
/// overflow) means "no bound".
pub fn parse_price_bound(input: &str) -> Option<u64> {
    static PRICE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PRICE_REGEX
        .get_or_init(|| Regex::new(r"^(?:\d+|\d{1,3}(?:[.,_ ]\d{3})+)$").unwrap());

    let trimmed = input.trim();
    if !regex.is_match(trimmed) {
        return None;
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Structured reading of a free-text query produced by an interpreter
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Interpretation {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Interpretation {
    /// Lowercase, trim and dedupe keywords, dropping blanks
    ///
    /// Returns `None` when nothing usable is left, in which case callers fall
    /// back to plain substring search.
    pub fn normalized(self) -> Option<Interpretation> {
        let mut keywords: Vec<String> = Vec::with_capacity(self.keywords.len());
        for keyword in self.keywords {
            let keyword = keyword.trim().to_lowercase();
            if !keyword.is_empty() && !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }

        if keywords.is_empty() {
            return None;
        }

        Some(Interpretation {
            category: self.category,
            keywords,
        })
    }
}

/// Everything that decides which listings match: the filter plus the
/// active interpretation (if any) of its search text
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub filter: FilterState,
    #[serde(default)]
    pub interpretation: Option<Interpretation>,
}

impl SearchCriteria {
    pub fn new(filter: FilterState) -> Self {
        Self {
            filter,
            interpretation: None,
        }
    }

    /// Whether the plain substring predicate applies
    pub fn uses_plain_text(&self) -> bool {
        self.interpretation.is_none()
    }
}
