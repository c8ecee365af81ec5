//! In-memory listing store and liked sets for testing and development

use crate::core::events::{EventBus, MarketEvent};
use crate::core::filter::{MarketTab, SortKey};
use crate::core::listing::{Listing, ListingId, UserId};
use crate::core::query::{ListingPage, PageRange, RemoteQuery};
use crate::core::service::{LikedSetSource, ListingSource, ViewCounter};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// In-memory listing table
///
/// Evaluates the remotely expressible part of a query the way the hosted
/// table would, and publishes change events when an [`EventBus`] is
/// attached. Uses RwLock for thread-safe access.
#[derive(Clone, Default)]
pub struct InMemoryListingStore {
    listings: Arc<RwLock<Vec<Listing>>>,
    event_bus: Option<EventBus>,
}

impl InMemoryListingStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish inserts, updates and deletions on `bus`
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    fn publish(&self, event: MarketEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }

    /// Insert a new listing
    pub fn insert(&self, listing: Listing) -> Result<Listing> {
        {
            let mut listings = self
                .listings
                .write()
                .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

            if listings.iter().any(|l| l.id == listing.id) {
                return Err(anyhow!("Listing {} already exists", listing.id));
            }
            listings.push(listing.clone());
        }

        self.publish(MarketEvent::ListingInserted {
            listing: listing.clone(),
        });
        Ok(listing)
    }

    /// Replace an existing listing
    pub fn update(&self, listing: Listing) -> Result<Listing> {
        {
            let mut listings = self
                .listings
                .write()
                .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

            let existing = listings
                .iter_mut()
                .find(|l| l.id == listing.id)
                .ok_or_else(|| anyhow!("Listing not found"))?;
            *existing = listing.clone();
        }

        self.publish(MarketEvent::ListingUpdated {
            listing: listing.clone(),
        });
        Ok(listing)
    }

    /// Delete a listing (no-op when absent)
    pub fn delete(&self, id: &ListingId) -> Result<()> {
        let removed = {
            let mut listings = self
                .listings
                .write()
                .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

            let before = listings.len();
            listings.retain(|l| &l.id != id);
            listings.len() != before
        };

        if removed {
            self.publish(MarketEvent::ListingDeleted { listing_id: *id });
        }
        Ok(())
    }

    pub fn get(&self, id: &ListingId) -> Result<Option<Listing>> {
        let listings = self
            .listings
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(listings.iter().find(|l| &l.id == id).cloned())
    }

    pub fn len(&self) -> usize {
        self.listings.read().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn matches_remote(listing: &Listing, query: &RemoteQuery) -> bool {
    listing.wanted == matches!(query.tab, MarketTab::Wanted)
        && query.category.is_none_or(|c| listing.category == c)
        && query
            .search
            .as_ref()
            .is_none_or(|s| listing.mentions(&s.to_lowercase()))
        && query.min_price.is_none_or(|min| listing.price >= min)
        && query.max_price.is_none_or(|max| listing.price <= max)
        && (!query.hide_sold || !listing.is_sold())
}

#[async_trait]
impl ListingSource for InMemoryListingStore {
    async fn fetch(&self, query: &RemoteQuery, range: PageRange) -> Result<ListingPage> {
        let listings = self
            .listings
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut matching: Vec<Listing> = listings
            .iter()
            .filter(|l| matches_remote(l, query))
            .cloned()
            .collect();

        match query.sort {
            SortKey::Newest => matching.sort_by(|a, b| b.posted_at.cmp(&a.posted_at)),
            SortKey::Oldest => matching.sort_by(|a, b| a.posted_at.cmp(&b.posted_at)),
            SortKey::PriceAsc => matching.sort_by_key(|l| l.price),
            SortKey::PriceDesc => matching.sort_by(|a, b| b.price.cmp(&a.price)),
        }

        let total = matching.len();
        let records = matching
            .into_iter()
            .skip(range.start)
            .take(range.rows())
            .collect();

        Ok(ListingPage {
            records,
            total: Some(total),
        })
    }
}

#[async_trait]
impl ViewCounter for InMemoryListingStore {
    async fn increment_views(&self, listing: ListingId) -> Result<()> {
        let updated = {
            let mut listings = self
                .listings
                .write()
                .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

            let existing = listings
                .iter_mut()
                .find(|l| l.id == listing)
                .ok_or_else(|| anyhow!("Listing not found"))?;
            existing.views += 1;
            existing.clone()
        };

        self.publish(MarketEvent::ListingUpdated { listing: updated });
        Ok(())
    }
}

/// In-memory per-viewer liked sets
///
/// `like`/`unlike` stand in for the external toggle action; the engine
/// only ever reads through [`LikedSetSource`].
#[derive(Clone, Default)]
pub struct InMemoryLikedSet {
    likes: Arc<RwLock<HashMap<UserId, HashSet<ListingId>>>>,
}

impl InMemoryLikedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn like(&self, viewer: UserId, listing: ListingId) -> Result<()> {
        let mut likes = self
            .likes
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        likes.entry(viewer).or_default().insert(listing);
        Ok(())
    }

    pub fn unlike(&self, viewer: UserId, listing: ListingId) -> Result<()> {
        let mut likes = self
            .likes
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        if let Some(set) = likes.get_mut(&viewer) {
            set.remove(&listing);
        }
        Ok(())
    }
}

#[async_trait]
impl LikedSetSource for InMemoryLikedSet {
    async fn fetch_liked_ids(&self, viewer: UserId) -> Result<HashSet<ListingId>> {
        let likes = self
            .likes
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(likes.get(&viewer).cloned().unwrap_or_default())
    }
}
