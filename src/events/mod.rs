use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod bus;
pub use bus::{EventBus, EventBusStats, Subscriber};

/// Name of the event announcing a login/logout
pub const AUTH_STATE_CHANGED: &str = "authStateChanged";
/// Name of the event announcing a cart mutation
pub const CART_UPDATED: &str = "cartUpdated";

/// Event published on the page-global bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageEvent {
    /// Event name (e.g. "authStateChanged")
    name: String,
    /// Arbitrary JSON payload
    payload: Value,
    /// When the event was created
    timestamp: DateTime<Utc>,
    /// Unique event ID
    id: String,
}

impl PageEvent {
    pub fn new(name: &str, payload: Value) -> Self {
        Self {
            name: name.to_string(),
            payload,
            timestamp: Utc::now(),
            id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Get the event name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the payload
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Get the timestamp
    pub fn timestamp(&self) -> &DateTime<Utc> {
        &self.timestamp
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Typed payload of the `authStateChanged` event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStateChanged {
    pub is_authenticated: bool,
}

impl AuthStateChanged {
    pub fn new(is_authenticated: bool) -> Self {
        Self { is_authenticated }
    }

    /// Wrap into a bus event
    pub fn to_event(self) -> PageEvent {
        PageEvent::new(
            AUTH_STATE_CHANGED,
            serde_json::json!({ "isAuthenticated": self.is_authenticated }),
        )
    }

    /// Extract from a bus event; `None` for other events or malformed payloads
    pub fn from_event(event: &PageEvent) -> Option<Self> {
        if event.name() != AUTH_STATE_CHANGED {
            return None;
        }
        serde_json::from_value(event.payload().clone()).ok()
    }
}

/// Typed payload of the `cartUpdated` event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartUpdated {
    pub item_count: u32,
    pub total_cents: u64,
}

impl CartUpdated {
    pub fn to_event(self) -> PageEvent {
        PageEvent::new(
            CART_UPDATED,
            serde_json::json!({ "itemCount": self.item_count, "totalCents": self.total_cents }),
        )
    }

    pub fn from_event(event: &PageEvent) -> Option<Self> {
        if event.name() != CART_UPDATED {
            return None;
        }
        serde_json::from_value(event.payload().clone()).ok()
    }
}
