//! Listing query engine
//!
//! Owns the filter, pagination and results of one listing view and exposes
//! the operations a page needs: change the filter, search, load the next
//! page, refresh, and read the rendered list.
//!
//! The engine is shared by reference (`&self`) between concurrent tasks.
//! State sits behind a mutex that is only held for the duration of a
//! reducer step, never across an `.await`.
//!
//! # Example
//!
//! ```rust,ignore
//! let engine = EngineBuilder::new()
//!     .with_listing_source(store.clone())
//!     .with_liked_source(likes.clone())
//!     .with_viewer(viewer_id)
//!     .build()?;
//!
//! engine.prime().await?;
//! engine
//!     .set_filter(FilterPatch::default().category(Category::Textbook).hide_sold(true))
//!     .await?;
//!
//! for listing in engine.snapshot().listings {
//!     println!("{} - {}", listing.title, listing.price);
//! }
//! ```

pub mod builder;
pub mod state;

pub use builder::EngineBuilder;
pub use state::{Action, Generation, Phase, QueryState, Transition};

use crate::config::MarketConfig;
use crate::core::error::{MarketError, SourceError};
use crate::core::events::MarketEvent;
use crate::core::filter::{FilterPatch, FilterState, Interpretation};
use crate::core::listing::{Listing, UserId};
use crate::core::predicate::apply_local_predicates;
use crate::core::query::{PageRange, RemoteQuery};
use crate::core::service::{LikedSetSource, ListingSource, QueryInterpreter};
use crate::core::sort::{LikedSet, sort_listings};
use chrono::Utc;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;

/// Result of a fetch-triggering operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was applied; `fetched` rows came back
    Applied { fetched: usize },
    /// A newer request superseded this one; its response was dropped
    Discarded,
    /// Nothing was fetched (no change, no more pages, or a fetch in flight)
    Skipped,
}

/// Everything a view needs to render
#[derive(Debug, Clone, Serialize)]
pub struct QuerySnapshot {
    /// Visible listings, filtered and sorted
    pub listings: Vec<Listing>,
    pub filter: FilterState,
    pub interpretation: Option<Interpretation>,
    pub phase: Phase,
    pub page: usize,
    pub has_more: bool,
    pub generation: Generation,
    pub last_error: Option<String>,
}

/// A fetch the reducer asked for
struct PendingFetch {
    generation: Generation,
    range: PageRange,
    query: RemoteQuery,
}

/// Query engine over a paginated listing source
pub struct ListingQueryEngine {
    source: Arc<dyn ListingSource>,
    liked_source: Option<Arc<dyn LikedSetSource>>,
    interpreter: Arc<dyn QueryInterpreter>,
    viewer: Option<UserId>,
    config: MarketConfig,
    state: Mutex<QueryState>,
    liked: OnceCell<LikedSet>,
}

impl ListingQueryEngine {
    fn lock(&self) -> MutexGuard<'_, QueryState> {
        // The reducer swaps whole values, a poisoned guard still holds a
        // consistent state
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, action: Action) -> Transition {
        let mut guard = self.lock();
        let current = std::mem::take(&mut *guard);
        let (next, transition) = current.reduce(action);
        *guard = next;
        transition
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn viewer(&self) -> Option<UserId> {
        self.viewer
    }

    /// Current filter state
    pub fn filter(&self) -> FilterState {
        self.lock().criteria.filter.clone()
    }

    /// Merge `patch` into the filter and re-fetch from page 0
    ///
    /// A patch that leaves the filter unchanged does nothing. Changing the
    /// search text through a patch drops any active interpretation. The
    /// merge happens under the state lock, so concurrent patches compose.
    pub async fn set_filter(&self, patch: FilterPatch) -> Result<FetchOutcome, MarketError> {
        match self.dispatch_fetch(Action::FilterPatched { patch }) {
            Ok(pending) => self.fetch_first_page(pending).await,
            Err(_) => {
                tracing::debug!("filter unchanged, skipping fetch");
                Ok(FetchOutcome::Skipped)
            }
        }
    }

    /// Re-issue the current criteria (manual retry)
    pub async fn refresh(&self) -> Result<FetchOutcome, MarketError> {
        match self.dispatch_fetch(Action::Refreshed) {
            Ok(pending) => self.fetch_first_page(pending).await,
            Err(other) => Err(MarketError::Internal(format!(
                "refresh produced {:?}",
                other
            ))),
        }
    }

    /// Load the liked set and the first page concurrently
    ///
    /// A liked-set failure is logged and leaves the set empty for this
    /// call; the page result is returned either way.
    pub async fn prime(&self) -> Result<FetchOutcome, MarketError> {
        let (liked, page) = futures::join!(self.load_liked(), self.refresh());
        if let Err(err) = liked {
            tracing::warn!(error = %err, "liked set unavailable, sorting without it");
        }
        page
    }

    /// Search with free text, using the interpreter when it cooperates
    ///
    /// On success the keyword predicate replaces substring matching and
    /// the interpreted category (if any) becomes the category filter.
    /// Otherwise the raw query is matched as a substring and the category
    /// is left alone. A blank query clears the search.
    ///
    /// The search takes its generation before the interpreter is asked.
    /// If any other request is issued while the interpretation is pending,
    /// this search is dropped and returns [`FetchOutcome::Discarded`].
    pub async fn search(&self, query: &str) -> Result<FetchOutcome, MarketError> {
        let query = query.trim().to_string();
        let generation = match self.dispatch(Action::SearchStarted) {
            Transition::Reserved { generation } => generation,
            other => {
                return Err(MarketError::Internal(format!(
                    "search start produced {:?}",
                    other
                )));
            }
        };

        let interpretation = if query.is_empty() {
            None
        } else {
            self.interpret_search(&query).await
        };

        let resolved = Action::SearchInterpreted {
            generation,
            query,
            interpretation,
        };
        match self.dispatch_fetch(resolved) {
            Ok(pending) => self.fetch_first_page(pending).await,
            Err(_) => {
                tracing::debug!(generation, "search superseded while interpreting");
                Ok(FetchOutcome::Discarded)
            }
        }
    }

    /// Ask the interpreter for a structured reading of `query`
    ///
    /// Never fails: errors, refusals, timeouts and keyword-less answers all
    /// come back as `None`.
    pub async fn interpret_search(&self, query: &str) -> Option<Interpretation> {
        let timeout = self.config.interpreter_timeout();
        match tokio::time::timeout(timeout, self.interpreter.interpret(query)).await {
            Ok(Ok(Some(interpretation))) => {
                let normalized = interpretation.normalized();
                if normalized.is_none() {
                    tracing::debug!("interpretation had no usable keywords, using plain text");
                }
                normalized
            }
            Ok(Ok(None)) => {
                tracing::debug!("interpreter declined, using plain text");
                None
            }
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "interpretation failed, using plain text");
                None
            }
            Err(_) => {
                tracing::debug!(
                    timeout_ms = self.config.interpreter_timeout_ms,
                    "interpretation timed out, using plain text"
                );
                None
            }
        }
    }

    /// Run a fetch-starting action and capture its query in the same step
    ///
    /// Returns the reducer's transition when it did not ask for a fetch.
    fn dispatch_fetch(&self, action: Action) -> Result<PendingFetch, Transition> {
        let mut guard = self.lock();
        let current = std::mem::take(&mut *guard);
        let (next, transition) = current.reduce(action);
        *guard = next;
        match transition {
            Transition::Dispatch { generation, range } => Ok(PendingFetch {
                generation,
                range,
                query: RemoteQuery::from_criteria(&guard.criteria),
            }),
            other => Err(other),
        }
    }

    async fn fetch_first_page(&self, pending: PendingFetch) -> Result<FetchOutcome, MarketError> {
        let PendingFetch {
            generation,
            range,
            query,
        } = pending;

        tracing::debug!(
            generation,
            start = range.start,
            end = range.end,
            "fetching first page"
        );

        match self.source.fetch(&query, range).await {
            Ok(page) => {
                let fetched = page.records.len();
                let transition = self.dispatch(Action::PageLoaded {
                    generation,
                    records: page.records,
                    fetched_at: Utc::now(),
                });
                if transition == Transition::Applied {
                    tracing::debug!(generation, fetched, "first page applied");
                    Ok(FetchOutcome::Applied { fetched })
                } else {
                    tracing::debug!(generation, "discarding superseded page");
                    Ok(FetchOutcome::Discarded)
                }
            }
            Err(err) => {
                let error = SourceError::page_fetch(0, &err);
                let transition = self.dispatch(Action::PageFailed {
                    generation,
                    message: error.to_string(),
                });
                if transition == Transition::Applied {
                    tracing::warn!(generation, error = %error, "listing fetch failed");
                    Err(error.into())
                } else {
                    tracing::debug!(generation, "discarding superseded failure");
                    Ok(FetchOutcome::Discarded)
                }
            }
        }
    }

    /// Fetch the next page with the unchanged criteria and append it
    ///
    /// No-op when there are no more pages or any request is in flight.
    pub async fn load_more(&self) -> Result<FetchOutcome, MarketError> {
        let PendingFetch {
            generation,
            range,
            query,
        } = match self.dispatch_fetch(Action::MoreRequested) {
            Ok(pending) => pending,
            Err(_) => {
                let state = self.lock();
                tracing::debug!(
                    phase = ?state.phase,
                    has_more = state.window.has_more,
                    "load_more ignored"
                );
                return Ok(FetchOutcome::Skipped);
            }
        };

        let page = page_index(range);
        tracing::debug!(generation, page, "fetching next page");

        match self.source.fetch(&query, range).await {
            Ok(result) => {
                let fetched = result.records.len();
                let transition = self.dispatch(Action::MoreLoaded {
                    generation,
                    records: result.records,
                });
                if transition == Transition::Applied {
                    Ok(FetchOutcome::Applied { fetched })
                } else {
                    tracing::debug!(generation, page, "discarding superseded page");
                    Ok(FetchOutcome::Discarded)
                }
            }
            Err(err) => {
                let error = SourceError::page_fetch(page, &err);
                let transition = self.dispatch(Action::MoreFailed {
                    generation,
                    message: error.to_string(),
                });
                if transition == Transition::Applied {
                    tracing::warn!(generation, page, error = %error, "next page fetch failed");
                    Err(error.into())
                } else {
                    Ok(FetchOutcome::Discarded)
                }
            }
        }
    }

    /// Fetch the viewer's liked set, once per engine
    ///
    /// Without a viewer or a liked source the set is empty.
    pub async fn load_liked(&self) -> Result<(), MarketError> {
        self.liked
            .get_or_try_init(|| async {
                let (Some(source), Some(viewer)) = (&self.liked_source, self.viewer) else {
                    return Ok(LikedSet::default());
                };
                let ids = source
                    .fetch_liked_ids(viewer)
                    .await
                    .map_err(|e| SourceError::LikedSet {
                        message: format!("{:#}", e),
                    })?;
                tracing::info!(viewer = %viewer, liked = ids.len(), "liked set loaded");
                Ok::<_, MarketError>(LikedSet::new(ids))
            })
            .await?;
        Ok(())
    }

    /// Liked set, empty until [`load_liked`](Self::load_liked) succeeds
    pub fn liked(&self) -> LikedSet {
        self.liked.get().cloned().unwrap_or_default()
    }

    /// Merge a realtime event into the results
    ///
    /// Returns `true` when the stored rows changed. Visibility of merged
    /// rows still goes through the active predicates.
    pub fn apply_event(&self, event: &MarketEvent) -> bool {
        let action = match event {
            MarketEvent::ListingInserted { listing } => Action::ListingInserted {
                listing: listing.clone(),
            },
            MarketEvent::ListingUpdated { listing } => Action::ListingUpdated {
                listing: listing.clone(),
            },
            MarketEvent::ListingDeleted { listing_id } => Action::ListingDeleted {
                listing_id: *listing_id,
            },
            MarketEvent::MessageReceived { .. } | MarketEvent::NotificationCreated { .. } => {
                return false;
            }
        };
        self.dispatch(action) == Transition::Applied
    }

    /// Filtered and sorted listings to render
    pub fn visible(&self) -> Vec<Listing> {
        self.snapshot().listings
    }

    /// Render the current state
    ///
    /// Predicates use the current criteria even while a newer fetch is in
    /// flight, so rows from a previous filter never show through. The
    /// recency window is measured from the time of the last applied fetch.
    pub fn snapshot(&self) -> QuerySnapshot {
        let state = self.lock();
        let now = state.fetched_at.unwrap_or_else(Utc::now);
        let filtered = apply_local_predicates(&state.records, &state.criteria, now);
        let empty = LikedSet::default();
        let liked = self.liked.get().unwrap_or(&empty);
        let listings = sort_listings(filtered, state.criteria.filter.sort, liked);

        QuerySnapshot {
            listings,
            filter: state.criteria.filter.clone(),
            interpretation: state.criteria.interpretation.clone(),
            phase: state.phase,
            page: state.window.page,
            has_more: state.window.has_more,
            generation: state.generation,
            last_error: state.last_error.clone(),
        }
    }
}

fn page_index(range: PageRange) -> usize {
    range.start / range.rows()
}
