use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, trace};

use super::PageEvent;

/// Statistics about event bus activity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventBusStats {
    /// Number of events delivered to at least one subscriber
    pub events_published: u64,
    /// Number of events dropped (no receivers)
    pub events_dropped: u64,
    /// Count of events by name
    pub name_counts: HashMap<String, u64>,
}

/// Page-global event bus. Broadcast, not queued: subscribers only see
/// events published after they subscribed, in publish order.
pub struct EventBus {
    sender: broadcast::Sender<PageEvent>,
    capacity: usize,
    pub(crate) stats: Arc<RwLock<EventBusStats>>,
}

impl EventBus {
    /// Create a new event bus with the specified capacity
    pub fn new(capacity: usize) -> Self {
        info!(capacity, "Creating new event bus");
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            capacity,
            stats: Arc::new(RwLock::new(EventBusStats::default())),
        }
    }

    /// Get a subscriber to receive events
    pub fn subscribe(&self) -> Subscriber {
        trace!("New subscriber registered to event bus");
        Subscriber {
            receiver: self.sender.subscribe(),
        }
    }

    /// Publish an event to all subscribers. Fire-and-forget: an event with
    /// no subscribers is counted as dropped, not reported as an error.
    pub async fn publish(&self, event: PageEvent) -> usize {
        let name = event.name().to_string();
        trace!(event = %name, "Publishing event to bus");

        match self.sender.send(event) {
            Ok(receivers) => {
                let mut stats = self.stats.write().await;
                stats.events_published += 1;
                *stats.name_counts.entry(name).or_insert(0) += 1;
                trace!(receivers, "Event published successfully");
                receivers
            }
            Err(_) => {
                // broadcast::send only fails when nobody is listening
                let mut stats = self.stats.write().await;
                stats.events_dropped += 1;
                *stats.name_counts.entry(name.clone()).or_insert(0) += 1;
                debug!(event = %name, "No receivers for event, message dropped");
                0
            }
        }
    }

    /// Get current event bus statistics
    pub async fn get_stats(&self) -> EventBusStats {
        self.stats.read().await.clone()
    }

    /// Reset all statistics counters
    pub async fn reset_stats(&self) {
        info!("Resetting event bus statistics");
        *self.stats.write().await = EventBusStats::default();
    }

    /// Get the configured capacity of the event bus
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the current number of subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            capacity: self.capacity,
            stats: Arc::clone(&self.stats),
        }
    }
}

/// Subscriber for receiving events from the bus
pub struct Subscriber {
    receiver: broadcast::Receiver<PageEvent>,
}

impl Subscriber {
    /// Receive the next event; `None` once the bus is gone
    pub async fn recv(&mut self) -> Option<PageEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Event subscriber lagged, skipping missed events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receive the next event if one is already queued
    pub fn try_recv(&mut self) -> Option<PageEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
