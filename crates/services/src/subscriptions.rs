//! # Subscription Store
//!
//! The canonical set of authors the viewer follows. Unlike likes and
//! bookmarks this is confirm-then-apply: nothing changes locally until the
//! server accepted the (un)subscribe.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use domains::{AppError, AuthorSnapshot, BlogApi, MutationEvent, Result};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::bus::EventBus;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionState {
    pub following: HashSet<Uuid>,
    /// Dedicated subscriber-count cache, filled by `load_subscriber_count`.
    pub subscriber_counts: HashMap<Uuid, u64>,
    /// Authors with a toggle in flight.
    pub pending: HashSet<Uuid>,
    pub error: Option<String>,
}

impl SubscriptionState {
    pub fn is_following(&self, author_id: Uuid) -> bool {
        self.following.contains(&author_id)
    }

    /// Prefers the cache when it holds a nonzero count, else the snapshot's.
    pub fn follower_count(&self, author: &AuthorSnapshot) -> u64 {
        match self.subscriber_counts.get(&author.id) {
            Some(&count) if count > 0 => count,
            _ => author.followers_count,
        }
    }

    /// Records a confirmed toggle, moving the cached count with it.
    fn confirm(&mut self, author_id: Uuid, subscribed: bool) {
        let changed = if subscribed {
            self.following.insert(author_id)
        } else {
            self.following.remove(&author_id)
        };
        if !changed {
            return;
        }
        if let Some(count) = self.subscriber_counts.get_mut(&author_id) {
            *count = if subscribed {
                count.saturating_add(1)
            } else {
                count.saturating_sub(1)
            };
        }
    }
}

pub struct SubscriptionStore {
    api: Arc<dyn BlogApi>,
    bus: Arc<EventBus>,
    state: Mutex<SubscriptionState>,
}

impl SubscriptionStore {
    pub fn new(api: Arc<dyn BlogApi>, bus: Arc<EventBus>) -> Arc<Self> {
        Arc::new(Self {
            api,
            bus,
            state: Mutex::new(SubscriptionState::default()),
        })
    }

    pub fn snapshot(&self) -> SubscriptionState {
        self.state.lock().clone()
    }

    pub fn is_following(&self, author_id: Uuid) -> bool {
        self.state.lock().is_following(author_id)
    }

    pub fn follower_count(&self, author: &AuthorSnapshot) -> u64 {
        self.state.lock().follower_count(author)
    }

    /// Subscribes or unsubscribes depending on current membership, then
    /// flips the set and notifies the post slices. Returns the new state.
    ///
    /// A second toggle for the same author while one is in flight is a no-op.
    #[instrument(skip(self))]
    pub async fn toggle(&self, author_id: Uuid) -> Result<bool> {
        let currently = {
            let mut state = self.state.lock();
            let currently = state.is_following(author_id);
            if !state.pending.insert(author_id) {
                debug!("toggle already in flight");
                return Ok(currently);
            }
            state.error = None;
            currently
        };

        let result = if currently {
            self.api.unsubscribe(author_id).await
        } else {
            self.api.subscribe(author_id).await
        };

        let subscribed = !currently;
        {
            let mut state = self.state.lock();
            state.pending.remove(&author_id);
            if let Err(err) = result {
                warn!(error = %err, "subscription change rejected");
                let err = AppError::from(err);
                state.error = Some(err.to_string());
                return Err(err);
            }
            state.confirm(author_id, subscribed);
        }
        info!(subscribed, "subscription changed");
        self.bus.publish(MutationEvent::AuthorSubscribed {
            author_id,
            subscribed,
        });
        Ok(subscribed)
    }

    /// Re-derives membership for one author from the server. Post flags are
    /// resynced but no follower counter moves: the server count already
    /// reflects this membership.
    #[instrument(skip(self))]
    pub async fn check(&self, author_id: Uuid) -> Result<bool> {
        let subscribed = self.api.subscription_status(author_id).await?;
        let changed = {
            let mut state = self.state.lock();
            if subscribed {
                state.following.insert(author_id)
            } else {
                state.following.remove(&author_id)
            }
        };
        if changed {
            self.bus.publish(MutationEvent::FollowStateSynced {
                author_id,
                subscribed,
            });
        }
        Ok(subscribed)
    }

    #[instrument(skip(self))]
    pub async fn load_subscriber_count(&self, author_id: Uuid) -> Result<u64> {
        let count = self.api.subscriber_count(author_id).await?;
        self.state.lock().subscriber_counts.insert(author_id, count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::fixtures::author;
    use domains::{ApiError, MockBlogApi};

    #[test]
    fn follower_count_prefers_nonzero_cache() {
        let mut snapshot = author("yor");
        snapshot.followers_count = 40;
        let mut state = SubscriptionState::default();
        assert_eq!(state.follower_count(&snapshot), 40);

        state.subscriber_counts.insert(snapshot.id, 0);
        assert_eq!(state.follower_count(&snapshot), 40);

        state.subscriber_counts.insert(snapshot.id, 57);
        assert_eq!(state.follower_count(&snapshot), 57);
    }

    #[tokio::test]
    async fn toggle_waits_for_confirmation() {
        let anya = author("anya").id;
        let mut api = MockBlogApi::new();
        api.expect_subscribe().times(1).returning(|_| Ok(()));
        api.expect_unsubscribe()
            .times(1)
            .returning(|_| Err(ApiError::Server { status: 500, message: "boom".into() }));
        let store = SubscriptionStore::new(Arc::new(api), EventBus::new());

        assert_eq!(store.toggle(anya).await, Ok(true));
        assert!(store.is_following(anya));

        assert!(store.toggle(anya).await.is_err());
        assert!(store.is_following(anya), "failed unsubscribe must not change membership");
        assert_eq!(store.snapshot().error.as_deref(), Some("boom"));
        assert!(store.snapshot().pending.is_empty());
    }

    #[tokio::test]
    async fn confirmed_toggle_moves_cached_count() {
        let loid = author("loid").id;
        let mut api = MockBlogApi::new();
        api.expect_subscriber_count().returning(|_| Ok(10));
        api.expect_subscribe().returning(|_| Ok(()));
        let store = SubscriptionStore::new(Arc::new(api), EventBus::new());

        store.load_subscriber_count(loid).await.unwrap();
        store.toggle(loid).await.unwrap();

        assert_eq!(store.snapshot().subscriber_counts.get(&loid), Some(&11));
    }

    #[tokio::test]
    async fn check_rederives_membership() {
        let bond = author("bond").id;
        let mut api = MockBlogApi::new();
        api.expect_subscription_status().returning(|_| Ok(true));
        let store = SubscriptionStore::new(Arc::new(api), EventBus::new());

        assert_eq!(store.check(bond).await, Ok(true));
        assert!(store.is_following(bond));
    }
}
