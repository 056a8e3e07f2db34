use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::StorefrontResult;
use crate::events::{AuthStateChanged, EventBus};
use crate::session::storage::StorageHandle;
use crate::session::token::{self, Principal};

/// Auth facade over the session token held in shared storage
pub struct AuthService {
    storage: StorageHandle,
    event_bus: Arc<EventBus>,
    token_key: String,
}

impl AuthService {
    pub fn new(storage: StorageHandle, event_bus: Arc<EventBus>, token_key: impl Into<String>) -> Self {
        Self {
            storage,
            event_bus,
            token_key: token_key.into(),
        }
    }

    pub fn token_key(&self) -> &str {
        &self.token_key
    }

    /// The raw session token, if a non-empty one is stored
    pub fn token(&self) -> Option<String> {
        self.storage
            .get(&self.token_key)
            .filter(|raw| token::is_present(raw))
    }

    /// The current principal. Absent, malformed or expired tokens all mean
    /// nobody is logged in.
    pub fn current_user(&self) -> Option<Principal> {
        let token = self.token()?;
        match token::decode_principal(&token) {
            Ok(principal) => Some(principal),
            Err(e) => {
                debug!(error = %e, "Stored token does not yield a principal");
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// Store a token obtained from the login flow.
    ///
    /// Storage notifications never reach the writing context, so this
    /// context is told through its own bus.
    pub async fn login(&self, token: &str) -> StorefrontResult<Principal> {
        let principal = token::decode_principal(token).map_err(|e| {
            warn!(error = %e, "Rejected login with unusable token");
            e
        })?;

        self.storage.set(&self.token_key, token);
        info!(user = %principal.id, role = %principal.role, "User logged in");
        self.event_bus
            .publish(AuthStateChanged::new(true).to_event())
            .await;
        Ok(principal)
    }

    /// Clear the session token
    pub async fn logout(&self) {
        if self.storage.get(&self.token_key).is_none() {
            debug!("Logout requested with no stored token");
            return;
        }
        self.storage.remove(&self.token_key);
        info!("User logged out");
        self.event_bus
            .publish(AuthStateChanged::new(false).to_event())
            .await;
    }

    /// Value for an `Authorization` header, if logged in
    pub fn bearer_header(&self) -> Option<String> {
        self.token().map(|token| format!("Bearer {}", token))
    }
}
