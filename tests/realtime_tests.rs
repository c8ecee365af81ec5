//! Integration tests for realtime merges
//!
//! Store mutations travel over the EventBus and are folded into the engine,
//! chat threads and notification feeds by `realtime::pump`.

mod market_harness;

use market::config::MarketConfig;
use market::core::events::{EventBus, MarketEvent};
use market::core::filter::FilterPatch;
use market::core::listing::{Category, ListingStatus};
use market::core::message::{ChatMessage, Notification, NotificationKind};
use market::engine::EngineBuilder;
use market::realtime::{ChatThread, DeliveryState, NotificationFeed, pump};
use market::storage::InMemoryListingStore;
use market::views::record_view;
use market_harness::*;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Poll `condition` until it holds or a second has passed
async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition never held");
}

// =============================================================================
// Listing merges
// =============================================================================

#[tokio::test]
async fn test_store_changes_reach_the_engine() {
    let bus = EventBus::new(64);
    let store = Arc::new(InMemoryListingStore::new().with_event_bus(bus.clone()));
    let desk = store.insert(listing("Desk", 300_000, Category::Furniture)).unwrap();
    let lamp = store.insert(listing("Lamp", 40_000, Category::Household)).unwrap();

    let engine = Arc::new(
        EngineBuilder::new()
            .with_listing_source(store.clone())
            .build()
            .unwrap(),
    );
    engine
        .set_filter(FilterPatch::default().hide_sold(true))
        .await
        .unwrap();
    assert_eq!(engine.visible().len(), 2);

    let listener = tokio::spawn(pump(bus.subscribe(), engine.clone()));

    store.insert(listing("Chair", 150_000, Category::Furniture)).unwrap();
    let mut sold_lamp = lamp.clone();
    sold_lamp.status = ListingStatus::Sold;
    store.update(sold_lamp).unwrap();
    store.delete(&desk.id).unwrap();

    wait_until(|| titles(&engine.visible()) == vec!["Chair"]).await;
    assert_eq!(engine.snapshot().generation, 1, "merges never refetch");

    listener.abort();
}

#[tokio::test]
async fn test_inserted_listing_outside_filter_stays_hidden() {
    let source = ScriptedSource::returning(vec![listing("Sofa", 1, Category::Furniture)]);
    let engine = engine_over(source, 20);
    engine
        .set_filter(FilterPatch::default().category(Category::Furniture))
        .await
        .unwrap();

    let kettle = listing("Kettle", 1, Category::Household);
    let stored = engine.apply_event(&MarketEvent::ListingInserted {
        listing: kettle.clone(),
    });
    let again = engine.apply_event(&MarketEvent::ListingInserted { listing: kettle });

    assert!(stored);
    assert!(!again, "duplicate insert ignored");
    assert_eq!(titles(&engine.visible()), vec!["Sofa"]);
}

#[tokio::test]
async fn test_unknown_update_and_foreign_events_are_ignored() {
    let engine = engine_over(ScriptedSource::returning(vec![]), 20);
    engine.refresh().await.unwrap();

    assert!(!engine.apply_event(&MarketEvent::ListingUpdated {
        listing: listing("Ghost", 1, Category::Other),
    }));
    assert!(!engine.apply_event(&MarketEvent::ListingDeleted {
        listing_id: Uuid::new_v4(),
    }));
    assert!(!engine.apply_event(&MarketEvent::NotificationCreated {
        notification: Notification::new(Uuid::new_v4(), NotificationKind::System, "hi"),
    }));
}

#[tokio::test]
async fn test_recorded_view_updates_visible_listing() {
    let bus = EventBus::new(16);
    let store = Arc::new(InMemoryListingStore::new().with_event_bus(bus.clone()));
    let bike = store.insert(listing("Bike", 900_000, Category::Vehicle)).unwrap();

    let engine = Arc::new(engine_over(store.clone(), 20));
    engine.refresh().await.unwrap();
    let listener = tokio::spawn(pump(bus.subscribe(), engine.clone()));

    record_view(store.clone(), bike.id).await.unwrap();

    wait_until(|| engine.visible().first().map(|l| l.views) == Some(1)).await;
    listener.abort();
}

// =============================================================================
// Chat and notifications
// =============================================================================

#[tokio::test]
async fn test_chat_thread_reconciles_echo_from_bus() {
    let viewer = Uuid::new_v4();
    let mut thread = ChatThread::new(Uuid::new_v4(), viewer);
    let sent = thread.push_optimistic("still for sale?");

    let bus = EventBus::new(16);
    let rx = bus.subscribe();
    bus.publish(MarketEvent::MessageReceived {
        message: ChatMessage {
            id: Uuid::new_v4(),
            ..sent.clone()
        },
    });
    bus.publish(MarketEvent::MessageReceived {
        message: ChatMessage {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            client_ref: None,
            ..sent
        },
    });
    drop(bus);

    let thread = pump(rx, thread).await;

    assert_eq!(thread.len(), 1);
    assert_eq!(thread.entries()[0].state, DeliveryState::Delivered);
    assert_eq!(thread.pending_count(), 0);
}

#[tokio::test]
async fn test_notification_feed_from_bus() {
    let me = Uuid::new_v4();
    let config = MarketConfig {
        notification_capacity: 2,
        ..Default::default()
    };
    let feed = NotificationFeed::new(me, config.notification_capacity);

    let bus = EventBus::new(config.event_capacity);
    let rx = bus.subscribe();
    for title in ["liked your desk", "new message", "desk sold"] {
        bus.publish(MarketEvent::NotificationCreated {
            notification: Notification::new(me, NotificationKind::Like, title),
        });
    }
    bus.publish(MarketEvent::NotificationCreated {
        notification: Notification::new(Uuid::new_v4(), NotificationKind::Like, "not mine"),
    });
    drop(bus);

    let feed = pump(rx, feed).await;

    assert_eq!(feed.len(), 2);
    assert_eq!(feed.unread_count(), 2);
    assert!(feed.iter().all(|n| n.recipient_id == me));
}
