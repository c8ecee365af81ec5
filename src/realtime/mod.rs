//! Realtime merge of change-feed events
//!
//! ```text
//! InMemoryListingStore ──publish──▶ EventBus ──subscribe──▶ pump() ──merge──▶ sink
//! ```
//!
//! A sink is anything implementing [`EventMerge`]: the listing query
//! engine, a [`ChatThread`] or a [`NotificationFeed`]. Each sink ignores
//! the events that are not addressed to it.

pub mod chat;
pub mod notifications;

pub use chat::{ChatEntry, ChatThread, DeliveryState};
pub use notifications::NotificationFeed;

use crate::core::events::{EventEnvelope, MarketEvent};
use crate::engine::ListingQueryEngine;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

/// Something that folds change-feed events into local state
pub trait EventMerge {
    /// Merge one event, returning `true` when local state changed
    fn merge(&mut self, event: &MarketEvent) -> bool;
}

impl EventMerge for &ListingQueryEngine {
    fn merge(&mut self, event: &MarketEvent) -> bool {
        self.apply_event(event)
    }
}

impl EventMerge for Arc<ListingQueryEngine> {
    fn merge(&mut self, event: &MarketEvent) -> bool {
        self.apply_event(event)
    }
}

impl<T: EventMerge> EventMerge for Arc<Mutex<T>> {
    fn merge(&mut self, event: &MarketEvent) -> bool {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .merge(event)
    }
}

/// Drain `rx` into `sink` until the bus closes, then hand the sink back
///
/// Lagging is not fatal: skipped events are logged and merging resumes
/// with the oldest retained event.
pub async fn pump<S: EventMerge>(rx: broadcast::Receiver<EventEnvelope>, mut sink: S) -> S {
    tracing::info!("realtime listener started");

    let mut events = BroadcastStream::new(rx);
    let mut merged = 0usize;
    while let Some(next) = events.next().await {
        match next {
            Ok(envelope) => {
                if sink.merge(&envelope.event) {
                    merged += 1;
                    tracing::debug!(
                        event_id = %envelope.id,
                        kind = envelope.event.kind(),
                        "merged realtime event"
                    );
                }
            }
            Err(BroadcastStreamRecvError::Lagged(count)) => {
                tracing::warn!(
                    count = count,
                    "realtime listener lagged, {} events skipped",
                    count
                );
            }
        }
    }

    tracing::info!(merged, "event bus closed, stopping realtime listener");
    sink
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::EventBus;
    use crate::core::message::{Notification, NotificationKind};
    use uuid::Uuid;

    #[derive(Default)]
    struct Recorder {
        kinds: Vec<&'static str>,
    }

    impl EventMerge for Recorder {
        fn merge(&mut self, event: &MarketEvent) -> bool {
            self.kinds.push(event.kind());
            true
        }
    }

    #[tokio::test]
    async fn test_pump_stops_when_bus_closes() {
        let bus = EventBus::new(16);
        let rx = bus.subscribe();
        let handle = tokio::spawn(pump(rx, Recorder::default()));

        bus.publish(MarketEvent::ListingDeleted {
            listing_id: Uuid::new_v4(),
        });
        bus.publish(MarketEvent::NotificationCreated {
            notification: Notification::new(Uuid::new_v4(), NotificationKind::System, "hi"),
        });
        drop(bus);

        let recorder = handle.await.unwrap();
        assert_eq!(
            recorder.kinds,
            vec!["listing_deleted", "notification_created"]
        );
    }

    #[tokio::test]
    async fn test_pump_survives_lag() {
        let bus = EventBus::new(2);
        let rx = bus.subscribe();
        for _ in 0..5 {
            bus.publish(MarketEvent::ListingDeleted {
                listing_id: Uuid::new_v4(),
            });
        }
        drop(bus);

        let recorder = pump(rx, Recorder::default()).await;
        assert_eq!(recorder.kinds.len(), 2, "only retained events are merged");
    }

    #[tokio::test]
    async fn test_shared_sink_through_mutex() {
        let shared = Arc::new(Mutex::new(Recorder::default()));
        let bus = EventBus::new(4);
        let rx = bus.subscribe();
        bus.publish(MarketEvent::ListingDeleted {
            listing_id: Uuid::new_v4(),
        });
        drop(bus);

        pump(rx, shared.clone()).await;
        assert_eq!(shared.lock().unwrap().kinds.len(), 1);
    }
}
