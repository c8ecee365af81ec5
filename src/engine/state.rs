//! Query state and its reducer
//!
//! All pagination and staleness rules live here as a pure function of
//! `(QueryState, Action)`. The async engine only performs I/O and feeds the
//! outcomes back as actions, so every transition can be tested without a
//! runtime.
//!
//! ```text
//! Idle ──patch/refresh──▶ Fetching(g) ──PageLoaded(g)──▶ Idle         (page 0, replaced)
//!                                     ──PageFailed(g)──▶ Failed       (kept only if same criteria)
//! Idle ──SearchStarted──▶ Interpreting(g) ──SearchInterpreted(g)──▶ Fetching(g)
//! Idle ──MoreRequested──▶ FetchingMore(g) ──MoreLoaded(g)──▶ Idle     (page + 1, appended)
//!                                         ──MoreFailed(g)──▶ Idle     (unchanged)
//! ```
//!
//! Every request takes its generation when it is issued. A search reserves
//! one before its interpretation starts, so a later request supersedes it
//! even if the interpreter answers last. Any response or interpretation
//! tagged with a generation other than the current one is discarded.

use crate::core::filter::{CategorySelector, FilterPatch, Interpretation, SearchCriteria};
use crate::core::listing::{Listing, ListingId};
use crate::core::query::{PageRange, PageWindow};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Monotonically increasing request token
pub type Generation = u64;

/// Fetch status of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    /// A search is waiting on its interpretation
    Interpreting { generation: Generation },
    /// A primary (page 0) fetch is in flight
    Fetching { generation: Generation },
    /// A next-page fetch is in flight
    FetchingMore { generation: Generation },
    /// The last primary fetch failed
    Failed,
}

impl Phase {
    /// Whether a request is outstanding
    pub fn is_fetching(&self) -> bool {
        matches!(
            self,
            Phase::Interpreting { .. } | Phase::Fetching { .. } | Phase::FetchingMore { .. }
        )
    }
}

/// Inputs to the reducer
#[derive(Debug, Clone)]
pub enum Action {
    /// Merge a patch into the filter; starts a new generation on change
    FilterPatched { patch: FilterPatch },
    /// Re-issue the current criteria under a new generation
    Refreshed,
    /// A search was issued; reserves its generation
    SearchStarted,
    /// The interpretation for a reserved search resolved (or was skipped)
    SearchInterpreted {
        generation: Generation,
        query: String,
        interpretation: Option<Interpretation>,
    },
    /// A primary fetch answered
    PageLoaded {
        generation: Generation,
        records: Vec<Listing>,
        fetched_at: DateTime<Utc>,
    },
    /// A primary fetch failed
    PageFailed {
        generation: Generation,
        message: String,
    },
    /// The caller wants the next page
    MoreRequested,
    /// A next-page fetch answered
    MoreLoaded {
        generation: Generation,
        records: Vec<Listing>,
    },
    /// A next-page fetch failed
    MoreFailed {
        generation: Generation,
        message: String,
    },
    /// Realtime: a row was inserted
    ListingInserted { listing: Listing },
    /// Realtime: a row was updated
    ListingUpdated { listing: Listing },
    /// Realtime: a row was deleted
    ListingDeleted { listing_id: ListingId },
}

/// What the reducer did with an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A fetch must now be issued for this generation and range
    Dispatch {
        generation: Generation,
        range: PageRange,
    },
    /// A generation was reserved; its fetch follows once the search resolves
    Reserved { generation: Generation },
    /// State changed
    Applied,
    /// The response belonged to a superseded generation
    Discarded,
    /// The action is not allowed in the current state (no-op)
    Rejected,
}

/// Complete engine state
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    /// Criteria of the most recently submitted request
    pub criteria: SearchCriteria,
    /// Criteria the current `records` were fetched for
    pub loaded_criteria: Option<SearchCriteria>,
    pub generation: Generation,
    pub phase: Phase,
    pub window: PageWindow,
    /// Raw rows in fetch order (pages appended, realtime merges applied)
    pub records: Vec<Listing>,
    /// Instant the recency window is measured from
    pub fetched_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new(SearchCriteria::default(), 20)
    }
}

impl QueryState {
    pub fn new(criteria: SearchCriteria, page_size: usize) -> Self {
        Self {
            criteria,
            loaded_criteria: None,
            generation: 0,
            phase: Phase::Idle,
            window: PageWindow::new(page_size),
            records: Vec::new(),
            fetched_at: None,
            last_error: None,
        }
    }

    /// Whether `records` belong to the current criteria
    pub fn is_current(&self) -> bool {
        self.loaded_criteria.as_ref() == Some(&self.criteria)
    }

    fn next_generation(&mut self) -> Generation {
        self.generation += 1;
        self.generation
    }

    fn fetch_first_page(&mut self, generation: Generation) -> Transition {
        self.phase = Phase::Fetching { generation };
        Transition::Dispatch {
            generation,
            range: PageRange::for_page(0, self.window.page_size),
        }
    }

    /// Advance the state by one action
    pub fn reduce(mut self, action: Action) -> (Self, Transition) {
        let transition = match action {
            Action::FilterPatched { patch } => {
                let filter = self.criteria.filter.apply(&patch);
                if filter == self.criteria.filter {
                    return (self, Transition::Rejected);
                }
                if filter.search != self.criteria.filter.search {
                    // An interpretation only describes the text it came from
                    self.criteria.interpretation = None;
                }
                self.criteria.filter = filter;
                let generation = self.next_generation();
                self.fetch_first_page(generation)
            }

            Action::Refreshed => {
                let generation = self.next_generation();
                self.fetch_first_page(generation)
            }

            Action::SearchStarted => {
                let generation = self.next_generation();
                self.phase = Phase::Interpreting { generation };
                Transition::Reserved { generation }
            }

            Action::SearchInterpreted {
                generation,
                query,
                interpretation,
            } => {
                if self.phase != (Phase::Interpreting { generation }) {
                    return (self, Transition::Discarded);
                }
                let mut filter = self
                    .criteria
                    .filter
                    .apply(&FilterPatch::default().search(query));
                if let Some(category) = interpretation.as_ref().and_then(|i| i.category) {
                    filter.category = CategorySelector::Only(category);
                }
                self.criteria = SearchCriteria {
                    filter,
                    interpretation,
                };
                self.fetch_first_page(generation)
            }

            Action::PageLoaded {
                generation,
                records,
                fetched_at,
            } => {
                if self.phase != (Phase::Fetching { generation }) {
                    return (self, Transition::Discarded);
                }
                self.window.page = 0;
                self.window.has_more = self.window.is_full(records.len());
                self.records = records;
                self.fetched_at = Some(fetched_at);
                self.loaded_criteria = Some(self.criteria.clone());
                self.last_error = None;
                self.phase = Phase::Idle;
                Transition::Applied
            }

            Action::PageFailed {
                generation,
                message,
            } => {
                if self.phase != (Phase::Fetching { generation }) {
                    return (self, Transition::Discarded);
                }
                if !self.is_current() {
                    // Results of another filter must not stand in for this one
                    self.records.clear();
                    self.window.page = 0;
                    self.window.has_more = false;
                    self.loaded_criteria = None;
                    self.fetched_at = None;
                }
                self.last_error = Some(message);
                self.phase = Phase::Failed;
                Transition::Applied
            }

            Action::MoreRequested => {
                if self.phase != Phase::Idle || !self.window.has_more || !self.is_current() {
                    return (self, Transition::Rejected);
                }
                self.phase = Phase::FetchingMore {
                    generation: self.generation,
                };
                Transition::Dispatch {
                    generation: self.generation,
                    range: self.window.next_range(),
                }
            }

            Action::MoreLoaded {
                generation,
                records,
            } => {
                if self.phase != (Phase::FetchingMore { generation }) {
                    return (self, Transition::Discarded);
                }
                self.window.page += 1;
                self.window.has_more = self.window.is_full(records.len());
                for record in records {
                    // Rows can shift between pages when new ones are inserted
                    if !self.records.iter().any(|r| r.id == record.id) {
                        self.records.push(record);
                    }
                }
                self.last_error = None;
                self.phase = Phase::Idle;
                Transition::Applied
            }

            Action::MoreFailed {
                generation,
                message,
            } => {
                if self.phase != (Phase::FetchingMore { generation }) {
                    return (self, Transition::Discarded);
                }
                self.last_error = Some(message);
                self.phase = Phase::Idle;
                Transition::Applied
            }

            Action::ListingInserted { listing } => {
                if self.records.iter().any(|r| r.id == listing.id) {
                    return (self, Transition::Rejected);
                }
                self.records.insert(0, listing);
                Transition::Applied
            }

            Action::ListingUpdated { listing } => {
                match self.records.iter_mut().find(|r| r.id == listing.id) {
                    Some(existing) => {
                        *existing = listing;
                        Transition::Applied
                    }
                    None => Transition::Rejected,
                }
            }

            Action::ListingDeleted { listing_id } => {
                let before = self.records.len();
                self.records.retain(|r| r.id != listing_id);
                if self.records.len() == before {
                    Transition::Rejected
                } else {
                    Transition::Applied
                }
            }
        };

        (self, transition)
    }
}
