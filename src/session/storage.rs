use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs;
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::error::{self, StorefrontResult};

const NOTIFICATION_CAPACITY: usize = 256;

/// Identifies one execution context (tab) sharing a storage origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(Uuid);

impl ContextId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Notification describing one committed storage mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    /// Key that changed; `None` when the whole store was cleared
    pub key: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    /// Context that performed the write
    pub origin: ContextId,
}

/// Key-value store shared by every context of one origin.
///
/// Mutations are broadcast to subscribers; a context never observes its
/// own writes as notifications.
#[derive(Debug)]
pub struct SharedStorage {
    entries: DashMap<String, String>,
    sender: broadcast::Sender<StorageChange>,
    /// Serializes mutate-then-notify so delivery order matches write order
    commit_lock: Mutex<()>,
    path: Option<PathBuf>,
}

impl SharedStorage {
    /// Create an in-memory store
    pub fn new() -> Arc<Self> {
        let (sender, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Arc::new(Self {
            entries: DashMap::new(),
            sender,
            commit_lock: Mutex::new(()),
            path: None,
        })
    }

    /// Open a store backed by a JSON file, loading existing entries
    pub async fn open(path: impl AsRef<Path>) -> StorefrontResult<Arc<Self>> {
        let path = path.as_ref().to_path_buf();
        let entries = DashMap::new();

        if fs::try_exists(&path).await.unwrap_or(false) {
            let raw = fs::read_to_string(&path)
                .await
                .map_err(|e| error::storage_read_failed(path.display().to_string(), e))?;
            let stored: BTreeMap<String, String> = serde_json::from_str(&raw)
                .map_err(|e| error::storage_read_failed(path.display().to_string(), e))?;
            for (key, value) in stored {
                entries.insert(key, value);
            }
            info!(path = %path.display(), entries = entries.len(), "Loaded shared storage");
        } else {
            debug!(path = %path.display(), "No storage file yet, starting empty");
        }

        let (sender, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Ok(Arc::new(Self {
            entries,
            sender,
            commit_lock: Mutex::new(()),
            path: Some(path),
        }))
    }

    /// Create a handle for a new execution context
    pub fn open_context(self: &Arc<Self>) -> StorageHandle {
        let context = ContextId::new();
        debug!(context = %context, "Opened storage context");
        StorageHandle {
            storage: Arc::clone(self),
            context,
        }
    }

    /// Flush entries to the backing file, if any
    pub async fn save(&self) -> StorefrontResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let snapshot: BTreeMap<String, String> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        let body = serde_json::to_string_pretty(&snapshot)?;
        fs::write(path, body)
            .await
            .map_err(|e| error::storage_write_failed(path.display().to_string(), e))?;
        debug!(path = %path.display(), entries = snapshot.len(), "Shared storage saved");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply `mutate` and broadcast the change it reports as one step.
    ///
    /// Concurrent writers from different contexts are serialized here, so
    /// every subscriber sees changes in the order they hit the map.
    fn commit(&self, mutate: impl FnOnce(&DashMap<String, String>) -> Option<StorageChange>) {
        let _guard = self
            .commit_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(change) = mutate(&self.entries) {
            trace!(key = ?change.key, origin = %change.origin, "Storage mutation committed");
            // Nobody listening is fine
            let _ = self.sender.send(change);
        }
    }
}

/// One context's view of the shared storage
#[derive(Clone)]
pub struct StorageHandle {
    storage: Arc<SharedStorage>,
    context: ContextId,
}

impl StorageHandle {
    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn storage(&self) -> &Arc<SharedStorage> {
        &self.storage
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.storage.entries.get(key).map(|v| v.value().clone())
    }

    /// Write a value. Writing the value already stored does not notify.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        let value = value.into();
        let origin = self.context;
        self.storage.commit(|entries| {
            let old_value = entries.insert(key.to_string(), value.clone());
            if old_value.as_deref() == Some(value.as_str()) {
                return None;
            }
            Some(StorageChange {
                key: Some(key.to_string()),
                old_value,
                new_value: Some(value),
                origin,
            })
        });
    }

    /// Remove a value. Removing a missing key does not notify.
    pub fn remove(&self, key: &str) {
        let origin = self.context;
        self.storage.commit(|entries| {
            let (_, old_value) = entries.remove(key)?;
            Some(StorageChange {
                key: Some(key.to_string()),
                old_value: Some(old_value),
                new_value: None,
                origin,
            })
        });
    }

    /// Remove every entry; other contexts see a single notification with no key
    pub fn clear(&self) {
        let origin = self.context;
        self.storage.commit(|entries| {
            if entries.is_empty() {
                return None;
            }
            entries.clear();
            Some(StorageChange {
                key: None,
                old_value: None,
                new_value: None,
                origin,
            })
        });
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.storage.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Subscribe to mutations made by other contexts
    pub fn subscribe(&self) -> StorageSubscription {
        StorageSubscription {
            receiver: self.storage.sender.subscribe(),
            context: self.context,
        }
    }
}

/// What a subscription observed next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageNotice {
    Changed(StorageChange),
    /// The subscriber fell behind and this many notifications were lost
    Lagged(u64),
}

/// Stream of storage notifications originating in other contexts
pub struct StorageSubscription {
    receiver: broadcast::Receiver<StorageChange>,
    context: ContextId,
}

impl StorageSubscription {
    /// Wait for the next foreign mutation or gap; `None` once the storage
    /// is gone
    pub async fn next_notice(&mut self) -> Option<StorageNotice> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if change.origin == self.context => continue,
                Ok(change) => return Some(StorageNotice::Changed(change)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, context = %self.context, "Storage subscriber lagged, changes lost");
                    return Some(StorageNotice::Lagged(skipped));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Wait for the next foreign mutation, stepping over gaps
    pub async fn recv(&mut self) -> Option<StorageChange> {
        loop {
            match self.next_notice().await? {
                StorageNotice::Changed(change) => return Some(change),
                StorageNotice::Lagged(_) => continue,
            }
        }
    }

    /// Next foreign mutation already queued, if any
    pub fn try_recv(&mut self) -> Option<StorageChange> {
        loop {
            match self.receiver.try_recv() {
                Ok(change) if change.origin == self.context => continue,
                Ok(change) => return Some(change),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, context = %self.context, "Storage subscriber lagged, changes lost");
                }
                Err(_) => return None,
            }
        }
    }
}
