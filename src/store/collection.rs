//! Watched / saved collections
//!
//! Each collection is a JSON array stored under a single key. Every mutation
//! reads the whole list, changes it, and writes the whole list back. Writes to
//! the same collection are serialized per store instance; separate processes
//! sharing one data directory can still overwrite each other.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::backend::KeyValueStore;
use super::subscribers::{Subscribers, Subscription};
use super::StoreError;
use crate::models::{Identity, SavedItem, WatchedItem, WatchedStats};

/// Storage key of the watched collection
pub const WATCHED_KEY: &str = "watched_items";

/// Storage key of the saved collection
pub const SAVED_KEY: &str = "saved_items";

/// Watched and saved collections over a key-value backend.
///
/// Construct one at startup and hand references to whoever needs it.
pub struct CollectionStore<S> {
    backend: S,
    watched_lock: Mutex<()>,
    saved_lock: Mutex<()>,
    saved_subscribers: Subscribers,
}

impl<S: KeyValueStore> CollectionStore<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            watched_lock: Mutex::new(()),
            saved_lock: Mutex::new(()),
            saved_subscribers: Subscribers::new(),
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    // -------------------------------------------------------------------------
    // Raw list access
    // -------------------------------------------------------------------------

    /// Lenient read: missing, unreadable or corrupt data is an empty list
    async fn read_or_empty<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match self.read_strict(key).await {
            Ok(items) => items,
            Err(e) => {
                warn!(key, error = %e, "could not read collection, treating it as empty");
                Vec::new()
            }
        }
    }

    /// Strict read used before a write, so a corrupt list is never clobbered
    async fn read_strict<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StoreError> {
        match self.backend.get(key).await? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    async fn write<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(items)?;
        self.backend.set(key, raw).await?;
        debug!(key, len = items.len(), "collection written");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Watched
    // -------------------------------------------------------------------------

    /// All watched items in storage order
    pub async fn list_watched(&self) -> Vec<WatchedItem> {
        self.read_or_empty(WATCHED_KEY).await
    }

    /// Insert, or replace the entry with the same identity
    pub async fn upsert_watched(&self, item: WatchedItem) -> Result<Identity, StoreError> {
        let _guard = self.watched_lock.lock().await;
        let identity = item.identity();
        let mut items: Vec<WatchedItem> = self.read_strict(WATCHED_KEY).await?;

        match items.iter_mut().find(|i| i.identity() == identity) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }

        self.write(WATCHED_KEY, &items).await?;
        info!(%identity, "watched item stored");
        Ok(identity)
    }

    pub async fn get_watched(&self, identity: Identity) -> Option<WatchedItem> {
        self.list_watched()
            .await
            .into_iter()
            .find(|i| i.identity() == identity)
    }

    /// Replace an existing entry. Returns `false` (and writes nothing) when
    /// no entry has the item's identity.
    pub async fn update_watched(&self, item: WatchedItem) -> Result<bool, StoreError> {
        let _guard = self.watched_lock.lock().await;
        let identity = item.identity();
        let mut items: Vec<WatchedItem> = self.read_strict(WATCHED_KEY).await?;

        let Some(existing) = items.iter_mut().find(|i| i.identity() == identity) else {
            debug!(%identity, "update skipped, item not watched");
            return Ok(false);
        };
        *existing = item;

        self.write(WATCHED_KEY, &items).await?;
        info!(%identity, "watched item updated");
        Ok(true)
    }

    /// Remove an entry; removing an absent identity is a no-op
    pub async fn remove_watched(&self, identity: Identity) -> Result<(), StoreError> {
        let _guard = self.watched_lock.lock().await;
        let mut items: Vec<WatchedItem> = self.read_strict(WATCHED_KEY).await?;
        items.retain(|i| i.identity() != identity);

        self.write(WATCHED_KEY, &items).await?;
        info!(%identity, "watched item removed");
        Ok(())
    }

    /// Record a title as watched and drop it from the saved list.
    ///
    /// The two writes are independent: if the second fails the item is
    /// watched but still saved.
    pub async fn mark_watched(&self, item: WatchedItem) -> Result<Identity, StoreError> {
        let identity = self.upsert_watched(item).await?;
        self.remove_if_saved(identity).await?;
        Ok(identity)
    }

    pub async fn watched_stats(&self) -> WatchedStats {
        WatchedStats::from_items(&self.list_watched().await)
    }

    // -------------------------------------------------------------------------
    // Saved
    // -------------------------------------------------------------------------

    /// All saved items in storage order
    pub async fn list_saved(&self) -> Vec<SavedItem> {
        self.read_or_empty(SAVED_KEY).await
    }

    pub async fn is_saved(&self, identity: Identity) -> bool {
        self.list_saved()
            .await
            .iter()
            .any(|i| i.identity() == identity)
    }

    /// Append an item. Returns `false` if the identity was already saved.
    pub async fn add_saved(&self, item: SavedItem) -> Result<bool, StoreError> {
        {
            let _guard = self.saved_lock.lock().await;
            let identity = item.identity();
            let mut items: Vec<SavedItem> = self.read_strict(SAVED_KEY).await?;

            if items.iter().any(|i| i.identity() == identity) {
                debug!(%identity, "already saved");
                return Ok(false);
            }
            items.push(item);

            self.write(SAVED_KEY, &items).await?;
            info!(%identity, "saved item added");
        }
        self.saved_subscribers.notify();
        Ok(true)
    }

    /// Remove an entry; removing an absent identity is a no-op
    pub async fn remove_saved(&self, identity: Identity) -> Result<(), StoreError> {
        {
            let _guard = self.saved_lock.lock().await;
            let mut items: Vec<SavedItem> = self.read_strict(SAVED_KEY).await?;
            items.retain(|i| i.identity() != identity);

            self.write(SAVED_KEY, &items).await?;
            info!(%identity, "saved item removed");
        }
        self.saved_subscribers.notify();
        Ok(())
    }

    /// Same as [`remove_saved`](Self::remove_saved); reads better at the
    /// call site when a saved title is being promoted to watched.
    pub async fn remove_if_saved(&self, identity: Identity) -> Result<(), StoreError> {
        self.remove_saved(identity).await
    }

    pub async fn clear_saved(&self) -> Result<(), StoreError> {
        {
            let _guard = self.saved_lock.lock().await;
            self.backend.remove(SAVED_KEY).await?;
            info!("saved list cleared");
        }
        self.saved_subscribers.notify();
        Ok(())
    }

    /// Call `listener` after every add / remove / clear of the saved list.
    /// Listeners run on the mutating task, in no particular order.
    pub fn subscribe_saved<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.saved_subscribers.subscribe(listener)
    }
}
