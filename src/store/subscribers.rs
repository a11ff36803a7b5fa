//! In-process change listeners
//!
//! Listeners take no arguments: they are told *that* something changed and
//! re-read the collection themselves.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// A list of zero-argument callbacks
#[derive(Clone, Default)]
pub struct Subscribers {
    registry: Arc<Mutex<Registry>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until the returned handle's
    /// `unsubscribe` is called.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Arc::new(listener)));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Invoke every registered listener
    pub fn notify(&self) {
        // Snapshot so listeners may (un)subscribe while being called
        let listeners: Vec<Listener> = lock(&self.registry)
            .listeners
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        for listener in listeners {
            listener();
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.registry).listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("listeners", &self.len())
            .finish()
    }
}

/// Handle returned by [`Subscribers::subscribe`]
#[must_use = "dropping a Subscription leaves the listener registered; call unsubscribe() to remove it"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Deregister the listener. A no-op if the owning store is gone.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_notify_calls_every_listener() {
        let subs = Subscribers::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let a = {
            let hits = Arc::clone(&hits);
            subs.subscribe(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };
        let b = {
            let hits = Arc::clone(&hits);
            subs.subscribe(move || {
                hits.fetch_add(10, Ordering::SeqCst);
            })
        };

        subs.notify();
        assert_eq!(hits.load(Ordering::SeqCst), 11);

        a.unsubscribe();
        subs.notify();
        assert_eq!(hits.load(Ordering::SeqCst), 21);
        assert_eq!(subs.len(), 1);

        b.unsubscribe();
        assert!(subs.is_empty());
    }

    #[test]
    fn test_unsubscribe_after_owner_dropped() {
        let subs = Subscribers::new();
        let handle = subs.subscribe(|| {});
        drop(subs);
        handle.unsubscribe();
    }

    #[test]
    fn test_listener_may_unsubscribe_during_notify() {
        let subs = Subscribers::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(AtomicUsize::new(0));

        let handle = {
            let slot = Arc::clone(&slot);
            let calls = Arc::clone(&calls);
            subs.subscribe(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                if let Some(own) = slot.lock().unwrap().take() {
                    own.unsubscribe();
                }
            })
        };
        *slot.lock().unwrap() = Some(handle);

        subs.notify();
        subs.notify();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(subs.is_empty());
    }
}
