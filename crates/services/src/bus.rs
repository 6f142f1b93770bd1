//! # Event Bus
//!
//! Synchronous publish/subscribe between store slices. A publish runs every
//! observer to completion before returning, so a mutation is visible in all
//! slices by the time the caller continues.

use std::sync::{Arc, Weak};

use domains::MutationEvent;
use parking_lot::RwLock;
use tracing::trace;

/// A store slice that reacts to mutation events published elsewhere.
pub trait MutationObserver: Send + Sync {
    fn observe(&self, event: &MutationEvent);
}

/// Observers are held weakly: stores own the bus, never the reverse.
#[derive(Default)]
pub struct EventBus {
    observers: RwLock<Vec<Weak<dyn MutationObserver>>>,
}

impl EventBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscribe(&self, observer: Weak<dyn MutationObserver>) {
        self.observers.write().push(observer);
    }

    /// Delivers `event` to every live observer, pruning dropped ones.
    ///
    /// Must not be called while holding a store's state lock.
    pub fn publish(&self, event: MutationEvent) {
        let observers: Vec<_> = self.observers.read().clone();
        trace!(kind = event.kind(), post_id = ?event.post_id(), observers = observers.len(), "publish");

        let mut dead = 0;
        for observer in &observers {
            match observer.upgrade() {
                Some(observer) => observer.observe(&event),
                None => dead += 1,
            }
        }
        if dead > 0 {
            self.observers.write().retain(|o| o.strong_count() > 0);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .iter()
            .filter(|o| o.strong_count() > 0)
            .count()
    }
}
