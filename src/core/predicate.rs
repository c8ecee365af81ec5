//! Local listing predicates
//!
//! The remote source already filters what it can express, but every fetched
//! page is re-checked here so the rendered set never violates the active
//! filter, whatever the source did.

use crate::core::filter::SearchCriteria;
use crate::core::listing::{Category, Condition, Listing};
use chrono::{DateTime, Utc};

/// A single pure filter over listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Matches the `wanted` flag of the active tab
    Tab { wanted: bool },
    /// Excludes sold listings
    HideSold,
    Category(Category),
    /// Lowercase substring of title or description
    Text(String),
    /// Any lowercase keyword is a substring of title or description
    Keywords(Vec<String>),
    /// Inclusive lower price bound
    MinPrice(u64),
    /// Inclusive upper price bound
    MaxPrice(u64),
    Condition(Condition),
    /// Posted at or after the instant
    PostedSince(DateTime<Utc>),
}

impl Predicate {
    pub fn matches(&self, listing: &Listing) -> bool {
        match self {
            Predicate::Tab { wanted } => listing.wanted == *wanted,
            Predicate::HideSold => !listing.is_sold(),
            Predicate::Category(category) => listing.category == *category,
            Predicate::Text(needle) => listing.mentions(needle),
            Predicate::Keywords(keywords) => keywords.iter().any(|k| listing.mentions(k)),
            Predicate::MinPrice(min) => listing.price >= *min,
            Predicate::MaxPrice(max) => listing.price <= *max,
            Predicate::Condition(condition) => listing.condition == *condition,
            Predicate::PostedSince(since) => listing.posted_at >= *since,
        }
    }
}

/// Build the active predicates for `criteria`, in evaluation order
///
/// `now` anchors the recency window.
pub fn predicates_for(criteria: &SearchCriteria, now: DateTime<Utc>) -> Vec<Predicate> {
    let filter = &criteria.filter;
    let mut predicates = vec![Predicate::Tab {
        wanted: filter.tab.wants_wanted(),
    }];

    if filter.hide_sold {
        predicates.push(Predicate::HideSold);
    }

    if let Some(category) = filter.category.category() {
        predicates.push(Predicate::Category(category));
    }

    match &criteria.interpretation {
        Some(interpretation) => {
            predicates.push(Predicate::Keywords(interpretation.keywords.clone()));
        }
        None => {
            if let Some(text) = filter.search_text() {
                predicates.push(Predicate::Text(text.to_lowercase()));
            }
        }
    }

    if let Some(min) = filter.min_price {
        predicates.push(Predicate::MinPrice(min));
    }
    if let Some(max) = filter.max_price {
        predicates.push(Predicate::MaxPrice(max));
    }

    if let Some(condition) = filter.condition {
        predicates.push(Predicate::Condition(condition));
    }

    if let Some(window) = filter.recency.duration() {
        predicates.push(Predicate::PostedSince(now - window));
    }

    predicates
}

/// Keep the listings that satisfy every active predicate, preserving order
pub fn apply_local_predicates(
    listings: &[Listing],
    criteria: &SearchCriteria,
    now: DateTime<Utc>,
) -> Vec<Listing> {
    let predicates = predicates_for(criteria, now);
    listings
        .iter()
        .filter(|listing| predicates.iter().all(|p| p.matches(listing)))
        .cloned()
        .collect()
}
