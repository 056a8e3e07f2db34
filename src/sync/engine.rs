use futures::future::join_all;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};

use crate::events::{AuthStateChanged, EventBus};
use crate::session::{token, StorageChange, StorageHandle, StorageNotice, StorageSubscription};
use crate::sync::ready::ReadyBarrier;
use crate::ui::Reconcile;

/// Default wait between a storage notification and reconciliation
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);
/// Default wait between page load and the first reconciliation
pub const DEFAULT_BOOTSTRAP_DELAY: Duration = Duration::from_millis(500);

/// Translates cross-tab storage notifications about the session token into
/// `authStateChanged` events and schedules reconciliation passes.
pub struct SessionSync {
    storage: StorageHandle,
    event_bus: Arc<EventBus>,
    token_key: String,
    /// Attached late; a pass that fires while this is empty does nothing
    reconciler: Arc<RwLock<Option<Arc<dyn Reconcile>>>>,
    ready: ReadyBarrier,
    settle_delay: Duration,
    bootstrap_delay: Duration,
    pending: Mutex<Vec<JoinHandle<()>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionSync {
    pub fn new(
        storage: StorageHandle,
        event_bus: Arc<EventBus>,
        token_key: impl Into<String>,
        ready: ReadyBarrier,
    ) -> Self {
        Self {
            storage,
            event_bus,
            token_key: token_key.into(),
            reconciler: Arc::new(RwLock::new(None)),
            ready,
            settle_delay: DEFAULT_SETTLE_DELAY,
            bootstrap_delay: DEFAULT_BOOTSTRAP_DELAY,
            pending: Mutex::new(Vec::new()),
            listener: Mutex::new(None),
        }
    }

    /// Override both reconciliation delays
    pub fn with_delays(mut self, settle_delay: Duration, bootstrap_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self.bootstrap_delay = bootstrap_delay;
        self
    }

    pub fn token_key(&self) -> &str {
        &self.token_key
    }

    pub fn ready(&self) -> &ReadyBarrier {
        &self.ready
    }

    pub async fn attach_reconciler(&self, reconciler: Arc<dyn Reconcile>) {
        *self.reconciler.write().await = Some(reconciler);
        debug!("Reconciler attached to session sync");
    }

    pub async fn detach_reconciler(&self) {
        *self.reconciler.write().await = None;
    }

    /// Handle one notification from another context.
    ///
    /// Notifications for any other key (including a full clear) are ignored
    /// entirely. Returns the event that was published, if any.
    pub async fn handle_storage_change(&self, change: &StorageChange) -> Option<AuthStateChanged> {
        if change.key.as_deref() != Some(self.token_key.as_str()) {
            trace!(key = ?change.key, "Ignoring storage change for unrelated key");
            return None;
        }

        let state = AuthStateChanged::new(
            change
                .new_value
                .as_deref()
                .map_or(false, token::is_present),
        );
        debug!(
            is_authenticated = state.is_authenticated,
            origin = %change.origin,
            "Session token changed in another context"
        );

        self.event_bus.publish(state.to_event()).await;
        self.schedule_reconcile(self.settle_delay).await;
        Some(state)
    }

    /// Announce the session found at page load.
    ///
    /// A stored token is announced immediately; no token means nothing is
    /// announced, since logged out is the assumed default. A reconciliation
    /// pass is scheduled either way.
    pub async fn bootstrap(&self) -> Option<AuthStateChanged> {
        let announced = match self.storage.get(&self.token_key) {
            Some(value) if token::is_present(&value) => {
                let state = AuthStateChanged::new(true);
                self.event_bus.publish(state.to_event()).await;
                Some(state)
            }
            _ => None,
        };
        info!(
            authenticated = announced.is_some(),
            "Session sync bootstrapped"
        );

        self.schedule_reconcile(self.bootstrap_delay).await;
        announced
    }

    /// Recover from lost notifications: announce the token as it is stored
    /// now and reconcile, as if the last lost change had arrived.
    pub async fn resync(&self, skipped: u64) -> AuthStateChanged {
        let state = AuthStateChanged::new(
            self.storage
                .get(&self.token_key)
                .map_or(false, |value| token::is_present(&value)),
        );
        warn!(
            skipped,
            is_authenticated = state.is_authenticated,
            "Storage notifications lost, resyncing session state"
        );
        self.event_bus.publish(state.to_event()).await;
        self.schedule_reconcile(self.settle_delay).await;
        state
    }

    /// Schedule one reconciliation pass: wait for the ready barrier, then
    /// the delay, then run the attached reconciler if there is one.
    pub async fn schedule_reconcile(&self, delay: Duration) {
        let reconciler = Arc::clone(&self.reconciler);
        let ready = self.ready.clone();

        let handle = tokio::spawn(async move {
            ready.wait().await;
            if !delay.is_zero() {
                sleep(delay).await;
            }
            let current = reconciler.read().await.clone();
            if let Some(reconciler) = current {
                reconciler.reconcile();
            }
        });

        let mut pending = self.pending.lock().await;
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Number of reconciliation passes scheduled but not yet run
    pub async fn pending_reconciliations(&self) -> usize {
        let mut pending = self.pending.lock().await;
        pending.retain(|h| !h.is_finished());
        pending.len()
    }

    /// Start feeding notifications from `subscription` through
    /// [`handle_storage_change`](Self::handle_storage_change), in delivery order.
    pub async fn spawn(self: &Arc<Self>, mut subscription: StorageSubscription) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            while let Some(notice) = subscription.next_notice().await {
                let Some(sync) = weak.upgrade() else {
                    break;
                };
                match notice {
                    StorageNotice::Changed(change) => {
                        sync.handle_storage_change(&change).await;
                    }
                    StorageNotice::Lagged(skipped) => {
                        sync.resync(skipped).await;
                    }
                }
            }
            debug!("Session sync listener stopped");
        });

        if let Some(previous) = self.listener.lock().await.replace(handle) {
            previous.abort();
        }
        info!(token_key = %self.token_key, "Session sync listening for storage changes");
    }

    /// Stop listening and discard pending passes. No pass runs after this
    /// returns.
    pub async fn shutdown(&self) {
        let mut handles: Vec<JoinHandle<()>> = self.pending.lock().await.drain(..).collect();
        if let Some(listener) = self.listener.lock().await.take() {
            handles.push(listener);
        }
        for handle in &handles {
            handle.abort();
        }
        let stopped = handles.len();
        join_all(handles).await;
        info!(stopped, "Session sync shut down");
    }
}
