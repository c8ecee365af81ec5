//! Service traits for the external collaborators of the query engine
//!
//! The engine is agnostic to the hosted backend: anything that can serve a
//! page of listings, a viewer's liked ids or a query interpretation can be
//! plugged in. Implementations report failures through `anyhow::Result`;
//! the engine classifies them at the boundary.

use crate::core::filter::Interpretation;
use crate::core::listing::{ListingId, UserId};
use crate::core::query::{ListingPage, PageRange, RemoteQuery};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;

/// Paginated source of listings (the remote table)
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch the rows of `range` that match `query`, ordered by `query.sort`
    async fn fetch(&self, query: &RemoteQuery, range: PageRange) -> Result<ListingPage>;
}

/// Source of the listings a viewer has liked
#[async_trait]
pub trait LikedSetSource: Send + Sync {
    async fn fetch_liked_ids(&self, viewer: UserId) -> Result<HashSet<ListingId>>;
}

/// Best-effort interpreter turning free text into structured criteria
///
/// `Ok(None)` means the interpreter declined (for example, no credentials
/// are configured). The engine treats errors the same way.
#[async_trait]
pub trait QueryInterpreter: Send + Sync {
    async fn interpret(&self, query: &str) -> Result<Option<Interpretation>>;
}

/// Side effect of opening a listing's detail page
#[async_trait]
pub trait ViewCounter: Send + Sync {
    async fn increment_views(&self, listing: ListingId) -> Result<()>;
}
