//! Unit tests for EventBus
//!
//! Covers publish/subscribe delivery, ordering and statistics tracking.

use crate::events::{AuthStateChanged, EventBus, PageEvent};
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn test_event_bus_publish_subscribe() {
    let bus = EventBus::new(100);
    let mut rx1 = bus.subscribe();
    let mut rx2 = bus.subscribe();

    let receivers = bus.publish(AuthStateChanged::new(true).to_event()).await;
    assert_eq!(receivers, 2);

    // Both subscribers should receive the event
    let received1 = timeout(Duration::from_secs(1), rx1.recv()).await.unwrap().unwrap();
    let received2 = timeout(Duration::from_secs(1), rx2.recv()).await.unwrap().unwrap();

    assert_eq!(received1.name(), "authStateChanged");
    assert_eq!(received1.id(), received2.id());

    let stats = bus.get_stats().await;
    assert_eq!(stats.events_published, 1);
    assert_eq!(*stats.name_counts.get("authStateChanged").unwrap(), 1);
}

#[tokio::test]
async fn test_event_bus_no_subscribers_is_not_an_error() {
    let bus = EventBus::new(100);

    let receivers = bus.publish(AuthStateChanged::new(false).to_event()).await;
    assert_eq!(receivers, 0);

    let stats = bus.get_stats().await;
    assert_eq!(stats.events_dropped, 1);
    assert_eq!(stats.events_published, 0);
}

#[tokio::test]
async fn test_delivery_order_matches_publish_order() {
    let bus = EventBus::new(100);
    let mut rx = bus.subscribe();

    for flag in [true, false, true, true, false] {
        bus.publish(AuthStateChanged::new(flag).to_event()).await;
    }

    let mut seen = Vec::new();
    while let Some(event) = rx.try_recv() {
        seen.push(AuthStateChanged::from_event(&event).unwrap().is_authenticated);
    }
    assert_eq!(seen, vec![true, false, true, true, false]);
}

#[tokio::test]
async fn test_late_subscriber_misses_earlier_events() {
    let bus = EventBus::new(100);
    let _early = bus.subscribe();
    bus.publish(PageEvent::new("first", serde_json::json!({}))).await;

    let mut late = bus.subscribe();
    assert!(late.try_recv().is_none());

    bus.publish(PageEvent::new("second", serde_json::json!({}))).await;
    assert_eq!(late.try_recv().unwrap().name(), "second");
}

#[tokio::test]
async fn test_reset_stats() {
    let bus = EventBus::new(100);
    let _rx = bus.subscribe();

    for i in 0..5 {
        bus.publish(PageEvent::new(&format!("test.event{}", i), serde_json::json!({ "n": i })))
            .await;
    }

    let stats_before = bus.get_stats().await;
    assert_eq!(stats_before.events_published, 5);

    bus.reset_stats().await;

    let stats_after = bus.get_stats().await;
    assert_eq!(stats_after.events_published, 0);
    assert_eq!(stats_after.name_counts.len(), 0);
}

#[tokio::test]
async fn test_subscriber_count() {
    let bus = EventBus::new(100);
    assert_eq!(bus.subscriber_count(), 0);

    let _rx1 = bus.subscribe();
    let _rx2 = bus.subscribe();
    assert_eq!(bus.subscriber_count(), 2);

    {
        let _temp = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 3);
    }
    assert_eq!(bus.subscriber_count(), 2);
}
