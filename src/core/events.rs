//! Typed change-feed events and the bus that carries them
//!
//! The hosted backend pushes row-level changes; an adapter turns each one
//! into a [`MarketEvent`] and publishes it on the [`EventBus`]. Consumers
//! (the listing engine, chat threads, notification feeds) drain a receiver
//! and apply an explicit merge function instead of mutating shared state
//! from a callback.
//!
//! # Architecture
//!
//! ```text
//! change feed ──▶ EventBus::publish() ──▶ broadcast ──▶ realtime::pump ──▶ ListingQueryEngine
//!                                                   ──▶ realtime::pump ──▶ ChatThread
//!                                                   ──▶ realtime::pump ──▶ NotificationFeed
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let bus = EventBus::new(1024);
//! let mut rx = bus.subscribe();
//!
//! bus.publish(MarketEvent::ListingDeleted { listing_id });
//!
//! if let Ok(envelope) = rx.recv().await {
//!     println!("Received: {:?}", envelope.event);
//! }
//! ```

use crate::core::listing::{Listing, ListingId};
use crate::core::message::{ChatMessage, Notification};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// A change observed on the remote store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketEvent {
    /// A listing row was inserted
    ListingInserted { listing: Listing },
    /// A listing row was updated (edit, status change, view count)
    ListingUpdated { listing: Listing },
    /// A listing row was deleted
    ListingDeleted { listing_id: ListingId },
    /// A chat message was persisted
    MessageReceived { message: ChatMessage },
    /// A notification was created
    NotificationCreated { notification: Notification },
}

impl MarketEvent {
    /// Short name of the event, matching its serialized tag
    pub fn kind(&self) -> &'static str {
        match self {
            MarketEvent::ListingInserted { .. } => "listing_inserted",
            MarketEvent::ListingUpdated { .. } => "listing_updated",
            MarketEvent::ListingDeleted { .. } => "listing_deleted",
            MarketEvent::MessageReceived { .. } => "message_received",
            MarketEvent::NotificationCreated { .. } => "notification_created",
        }
    }

    /// Listing this event relates to (if applicable)
    pub fn listing_id(&self) -> Option<ListingId> {
        match self {
            MarketEvent::ListingInserted { listing } | MarketEvent::ListingUpdated { listing } => {
                Some(listing.id)
            }
            MarketEvent::ListingDeleted { listing_id } => Some(*listing_id),
            MarketEvent::MessageReceived { message } => message.listing_id,
            MarketEvent::NotificationCreated { notification } => notification.listing_id,
        }
    }
}

/// Envelope wrapping an event with delivery metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event was published
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: MarketEvent,
}

impl EventEnvelope {
    pub fn new(event: MarketEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus
///
/// Bounded: once `capacity` envelopes are buffered, slow receivers lose
/// the oldest ones and observe a `Lagged` error on their next receive.
/// Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero, like `tokio::sync::broadcast::channel`.
    /// `MarketConfig::validate` rejects that value before it gets here.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Never fails. Without subscribers the event is dropped.
    /// Returns the number of receivers that will receive the event.
    pub fn publish(&self, event: MarketEvent) -> usize {
        let envelope = EventEnvelope::new(event);
        // send() returns Err only if there are no receivers, which is fine
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Get the current number of active subscribers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
