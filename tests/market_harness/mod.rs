//! Shared test harness for engine integration tests
//!
//! Provides listing fixtures and scripted collaborators:
//! - `ScriptedSource` answers from a queue of canned pages or failures
//! - `GatedSource` parks every fetch until the test opens its gate
//! - `DelayedInterpreter` answers each query after its own delay
//! - `CountingLikedSource` and `FailingInterpreter` for the side paths
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! mod market_harness;
//! use market_harness::*;
//! ```

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use uuid::Uuid;

use market::config::MarketConfig;
use market::core::filter::Interpretation;
use market::core::listing::{Category, Condition, Listing, ListingId, ListingStatus, UserId};
use market::core::query::{ListingPage, PageRange, RemoteQuery};
use market::core::service::{LikedSetSource, ListingSource, QueryInterpreter};
use market::engine::{EngineBuilder, ListingQueryEngine};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn listing(title: &str, price: u64, category: Category) -> Listing {
    Listing::new(
        Uuid::new_v4(),
        title,
        "",
        price,
        category,
        Condition::Good,
    )
}

pub fn sold(title: &str, price: u64, category: Category) -> Listing {
    let mut listing = listing(title, price, category);
    listing.status = ListingStatus::Sold;
    listing
}

pub fn described(title: &str, description: &str, category: Category) -> Listing {
    let mut listing = listing(title, 10_000, category);
    listing.description = description.to_string();
    listing
}

pub fn prices(listings: &[Listing]) -> Vec<u64> {
    listings.iter().map(|l| l.price).collect()
}

pub fn titles(listings: &[Listing]) -> Vec<String> {
    listings.iter().map(|l| l.title.clone()).collect()
}

/// Config with a small page size so pagination is easy to exercise
pub fn config_with_page_size(page_size: usize) -> MarketConfig {
    MarketConfig {
        page_size,
        interpreter_timeout_ms: 50,
        ..Default::default()
    }
}

/// Listing posted `hours` before now
pub fn posted_hours_ago(title: &str, price: u64, hours: i64) -> Listing {
    let mut listing = listing(title, price, Category::Other);
    listing.posted_at = chrono::Utc::now() - chrono::Duration::hours(hours);
    listing
}

pub fn engine_over(source: Arc<dyn ListingSource>, page_size: usize) -> ListingQueryEngine {
    EngineBuilder::new()
        .with_listing_source(source)
        .with_config(config_with_page_size(page_size))
        .build()
        .expect("engine should build")
}

// ---------------------------------------------------------------------------
// ScriptedSource
// ---------------------------------------------------------------------------

/// Source replaying queued responses, then a default page
///
/// The default page is returned as is, without slicing by range, so tests
/// control exactly which rows reach the local predicates.
pub struct ScriptedSource {
    default: Vec<Listing>,
    queue: Mutex<VecDeque<Result<Vec<Listing>, String>>>,
    calls: Mutex<Vec<(RemoteQuery, PageRange)>>,
}

impl ScriptedSource {
    pub fn returning(default: Vec<Listing>) -> Arc<Self> {
        Arc::new(Self {
            default,
            queue: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn push_page(&self, records: Vec<Listing>) {
        self.queue.lock().unwrap().push_back(Ok(records));
    }

    pub fn push_failure(&self, message: &str) {
        self.queue
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn calls(&self) -> Vec<(RemoteQuery, PageRange)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_query(&self) -> RemoteQuery {
        self.calls
            .lock()
            .unwrap()
            .last()
            .map(|(query, _)| query.clone())
            .expect("no fetch recorded")
    }
}

#[async_trait]
impl ListingSource for ScriptedSource {
    async fn fetch(&self, query: &RemoteQuery, range: PageRange) -> Result<ListingPage> {
        self.calls.lock().unwrap().push((query.clone(), range));
        let next = self.queue.lock().unwrap().pop_front();
        match next {
            Some(Ok(records)) => Ok(ListingPage::new(records)),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(ListingPage::new(self.default.clone())),
        }
    }
}

// ---------------------------------------------------------------------------
// GatedSource
// ---------------------------------------------------------------------------

type GateReply = Result<Vec<Listing>, String>;

/// Source whose fetches block until the matching [`Gate`] is opened
///
/// Gates are consumed in call order: the n-th fetch waits on the n-th gate
/// created. A fetch with no gate prepared fails immediately.
#[derive(Default)]
pub struct GatedSource {
    calls: AtomicUsize,
    gates: Mutex<VecDeque<oneshot::Receiver<GateReply>>>,
}

pub struct Gate(oneshot::Sender<GateReply>);

impl Gate {
    pub fn open(self, records: Vec<Listing>) {
        let _ = self.0.send(Ok(records));
    }

    pub fn fail(self, message: &str) {
        let _ = self.0.send(Err(message.to_string()));
    }
}

impl GatedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn gate(&self) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        Gate(tx)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` fetches have started
    pub async fn wait_for_calls(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.calls() < n {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("fetch was never issued");
    }
}

#[async_trait]
impl ListingSource for GatedSource {
    async fn fetch(&self, _query: &RemoteQuery, _range: PageRange) -> Result<ListingPage> {
        let gate = self.gates.lock().unwrap().pop_front();
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = gate.ok_or_else(|| anyhow!("no gate prepared"))?;
        match gate.await {
            Ok(Ok(records)) => Ok(ListingPage::new(records)),
            Ok(Err(message)) => Err(anyhow!(message)),
            Err(_) => Err(anyhow!("gate dropped")),
        }
    }
}

// ---------------------------------------------------------------------------
// Side collaborators
// ---------------------------------------------------------------------------

/// Liked source counting how often it is asked
pub struct CountingLikedSource {
    ids: HashSet<ListingId>,
    calls: AtomicUsize,
    fail: bool,
}

impl CountingLikedSource {
    pub fn with_ids(ids: impl IntoIterator<Item = ListingId>) -> Arc<Self> {
        Arc::new(Self {
            ids: ids.into_iter().collect(),
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            ids: HashSet::new(),
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LikedSetSource for CountingLikedSource {
    async fn fetch_liked_ids(&self, _viewer: UserId) -> Result<HashSet<ListingId>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("liked set service unavailable"));
        }
        Ok(self.ids.clone())
    }
}

/// Interpreter that always errors
pub struct FailingInterpreter;

#[async_trait]
impl QueryInterpreter for FailingInterpreter {
    async fn interpret(&self, _query: &str) -> Result<Option<Interpretation>> {
        Err(anyhow!("model quota exceeded"))
    }
}

/// Interpreter that answers far too late
pub struct SlowInterpreter(pub Interpretation);

#[async_trait]
impl QueryInterpreter for SlowInterpreter {
    async fn interpret(&self, _query: &str) -> Result<Option<Interpretation>> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Some(self.0.clone()))
    }
}

/// Interpreter answering each known query after its own delay
///
/// Unknown queries are declined immediately.
#[derive(Default)]
pub struct DelayedInterpreter {
    replies: HashMap<String, (Duration, Option<Interpretation>)>,
}

impl DelayedInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(
        mut self,
        query: &str,
        delay: Duration,
        interpretation: Option<Interpretation>,
    ) -> Self {
        self.replies
            .insert(query.to_string(), (delay, interpretation));
        self
    }
}

#[async_trait]
impl QueryInterpreter for DelayedInterpreter {
    async fn interpret(&self, query: &str) -> Result<Option<Interpretation>> {
        let Some((delay, interpretation)) = self.replies.get(query).cloned() else {
            return Ok(None);
        };
        tokio::time::sleep(delay).await;
        Ok(interpretation)
    }
}
