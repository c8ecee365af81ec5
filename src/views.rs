//! Fire-and-forget view counting

use crate::core::error::SourceError;
use crate::core::listing::ListingId;
use crate::core::service::ViewCounter;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Record a view of `listing` in the background
///
/// Opening a listing never waits on the counter; a failed increment is
/// logged and otherwise ignored.
pub fn record_view(counter: Arc<dyn ViewCounter>, listing: ListingId) -> JoinHandle<()> {
    tokio::spawn(async move {
        match counter.increment_views(listing).await {
            Ok(()) => tracing::debug!(listing_id = %listing, "view recorded"),
            Err(err) => {
                let error = SourceError::ViewCount {
                    listing_id: listing,
                    message: format!("{:#}", err),
                };
                tracing::warn!(code = error.error_code(), "{}", error);
            }
        }
    })
}
