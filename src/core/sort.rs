//! Liked-first ordering of filtered listings

use crate::core::filter::SortKey;
use crate::core::listing::{Listing, ListingId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Listing ids the current viewer has marked
///
/// Read-only from the engine's point of view: it is fetched once per viewer
/// session and only replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikedSet(HashSet<ListingId>);

impl LikedSet {
    pub fn new(ids: HashSet<ListingId>) -> Self {
        Self(ids)
    }

    pub fn contains(&self, id: &ListingId) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ListingId> for LikedSet {
    fn from_iter<I: IntoIterator<Item = ListingId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn compare_by_key(a: &Listing, b: &Listing, sort: SortKey) -> Ordering {
    match sort {
        SortKey::Newest => b.posted_at.cmp(&a.posted_at),
        SortKey::Oldest => a.posted_at.cmp(&b.posted_at),
        SortKey::PriceAsc => a.price.cmp(&b.price),
        SortKey::PriceDesc => b.price.cmp(&a.price),
    }
}

/// Stable sort: liked listings first, then by `sort` within each group
///
/// Equal keys keep their incoming (fetch) order.
pub fn sort_listings(mut listings: Vec<Listing>, sort: SortKey, liked: &LikedSet) -> Vec<Listing> {
    listings.sort_by(|a, b| {
        let a_liked = liked.contains(&a.id);
        let b_liked = liked.contains(&b.id);
        b_liked
            .cmp(&a_liked)
            .then_with(|| compare_by_key(a, b, sort))
    });
    listings
}
