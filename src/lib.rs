//! # Campus Market
//!
//! Listing query engine for a student marketplace.
//!
//! ## Features
//!
//! - **Faceted filtering**: tab, category, price bounds, condition, recency, sold state
//! - **Liked-first sorting**: liked listings float above the chosen sort order
//! - **Pagination**: fixed-size pages with at most one next-page load in flight
//! - **Stale response discard**: every request takes a generation token when issued;
//!   responses of superseded requests are dropped
//! - **Search interpretation**: free text goes through a pluggable interpreter and
//!   degrades to substring search
//! - **Realtime merges**: listing, chat and notification events from a broadcast bus
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use market::prelude::*;
//!
//! let store = Arc::new(InMemoryListingStore::new());
//! store.insert(Listing::new(
//!     seller,
//!     "Calculus 2e",
//!     "",
//!     150_000,
//!     Category::Textbook,
//!     Condition::Good,
//! ))?;
//!
//! let engine = EngineBuilder::new()
//!     .with_listing_source(store.clone())
//!     .build()?;
//!
//! engine
//!     .set_filter(FilterPatch::default().sort(SortKey::PriceAsc).hide_sold(true))
//!     .await?;
//! let visible = engine.visible();
//! ```

pub mod config;
pub mod core;
pub mod engine;
pub mod interpret;
pub mod realtime;
pub mod storage;
pub mod telemetry;
pub mod views;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Types ===
    pub use crate::core::{
        error::{ConfigError, MarketError, SourceError},
        events::{EventBus, EventEnvelope, MarketEvent},
        filter::{
            CategorySelector, FilterPatch, FilterState, Interpretation, MarketTab, RecencyWindow,
            SearchCriteria, SortKey,
        },
        listing::{Category, Condition, Listing, ListingId, ListingStatus, TradeMethod, UserId},
        message::{ChatMessage, Notification, NotificationKind},
        query::{ListingPage, PageRange, RemoteQuery},
        service::{LikedSetSource, ListingSource, QueryInterpreter, ViewCounter},
        sort::LikedSet,
    };

    // === Engine ===
    pub use crate::engine::{EngineBuilder, FetchOutcome, ListingQueryEngine, Phase, QuerySnapshot};

    // === Realtime ===
    pub use crate::realtime::{ChatThread, EventMerge, NotificationFeed, pump};

    // === Storage ===
    pub use crate::storage::{
        FixedInterpreter, InMemoryLikedSet, InMemoryListingStore, NoInterpreter,
    };

    // === Interpretation ===
    #[cfg(feature = "ai")]
    pub use crate::interpret::GenerativeInterpreter;

    // === Config ===
    pub use crate::config::MarketConfig;

    pub use crate::views::record_view;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
    pub use uuid::Uuid;
}
