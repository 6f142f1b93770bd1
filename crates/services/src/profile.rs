//! # Profile Store
//!
//! One viewed user and their posts, paginated like the feed.

use std::sync::{Arc, Weak};

use domains::{AppError, BlogApi, MutationEvent, Post, PostStatus, Result, User};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::bus::{EventBus, MutationObserver};
use crate::sync;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileState {
    pub user: Option<User>,
    pub posts: Vec<Post>,
    pub page: u32,
    pub total: u64,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<String>,
    /// User of the most recent `load`; responses for anyone else are dropped.
    pub requested: Option<Uuid>,
}

impl ProfileState {
    fn apply(&mut self, event: &MutationEvent) {
        match event {
            MutationEvent::PostCreated { post } => {
                let mine = self.user.as_ref().is_some_and(|u| post.is_by(u.id));
                if mine && post.status == PostStatus::Published {
                    self.posts.insert(0, (**post).clone());
                    self.total += 1;
                }
            }
            MutationEvent::PostDeleted { .. } => {
                if sync::apply_to_list(&mut self.posts, event) > 0 {
                    self.total = self.total.saturating_sub(1);
                    if let Some(user) = self.user.as_mut() {
                        user.posts_count = user.posts_count.saturating_sub(1);
                    }
                }
            }
            MutationEvent::AuthorSubscribed {
                author_id,
                subscribed,
            } => {
                sync::apply_to_list(&mut self.posts, event);
                if let Some(user) = self.user.as_mut().filter(|u| u.id == *author_id) {
                    user.followers_count = if *subscribed {
                        user.followers_count.saturating_add(1)
                    } else {
                        user.followers_count.saturating_sub(1)
                    };
                }
            }
            _ => {
                sync::apply_to_list(&mut self.posts, event);
            }
        }
    }
}

pub struct ProfileStore {
    api: Arc<dyn BlogApi>,
    page_size: u32,
    state: Mutex<ProfileState>,
}

impl ProfileStore {
    pub fn new(api: Arc<dyn BlogApi>, bus: &EventBus, page_size: u32) -> Arc<Self> {
        let store = Arc::new(Self {
            api,
            page_size,
            state: Mutex::new(ProfileState::default()),
        });
        let weak = Arc::downgrade(&store);
        let observer: Weak<dyn MutationObserver> = weak;
        bus.subscribe(observer);
        store
    }

    pub fn snapshot(&self) -> ProfileState {
        self.state.lock().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.lock().user.clone()
    }

    pub fn posts(&self) -> Vec<Post> {
        self.state.lock().posts.clone()
    }

    /// Loads the user and the first page of their posts.
    #[instrument(skip(self))]
    pub async fn load(&self, user_id: Uuid) -> Result<()> {
        *self.state.lock() = ProfileState {
            loading: true,
            has_more: true,
            requested: Some(user_id),
            ..Default::default()
        };

        let result = match self.api.get_user(user_id).await {
            Ok(user) => self
                .api
                .list_user_posts(user_id, 1, self.page_size)
                .await
                .map(|page| (user, page)),
            Err(err) => Err(err),
        };

        let mut state = self.state.lock();
        if state.requested != Some(user_id) {
            debug!("superseded profile response dropped");
            return Ok(());
        }
        state.loading = false;
        match result {
            Ok((user, page)) => {
                info!(username = %user.username, posts = page.items.len(), "profile loaded");
                state.has_more = page.has_more();
                state.total = page.total;
                state.page = 1;
                state.posts = page.items;
                state.user = Some(user);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "profile load failed");
                let err = AppError::from(err);
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Appends the next page of the user's posts. Returns `false` when
    /// skipped (nothing loaded, in flight, or exhausted).
    #[instrument(skip(self))]
    pub async fn load_more(&self) -> Result<bool> {
        let (user_id, next) = {
            let mut state = self.state.lock();
            let Some(user_id) = state.requested else {
                return Ok(false);
            };
            if state.loading || !state.has_more {
                return Ok(false);
            }
            state.loading = true;
            (user_id, state.page + 1)
        };

        let result = self.api.list_user_posts(user_id, next, self.page_size).await;

        let mut state = self.state.lock();
        if state.requested != Some(user_id) {
            debug!("profile changed while page was in flight");
            return Ok(false);
        }
        state.loading = false;
        match result {
            Ok(page) => {
                state.has_more = page.has_more();
                state.total = page.total;
                state.page = next;
                sync::append_unseen(&mut state.posts, page.items);
                Ok(true)
            }
            Err(err) => {
                let err = AppError::from(err);
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }
}

impl MutationObserver for ProfileStore {
    fn observe(&self, event: &MutationEvent) {
        self.state.lock().apply(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::fixtures::{author, post_by};
    use domains::{MockBlogApi, Page, Role};

    fn user_from(snapshot: &domains::AuthorSnapshot) -> User {
        User {
            id: snapshot.id,
            display_name: snapshot.display_name.clone(),
            username: snapshot.username.clone(),
            avatar_url: None,
            role: Role::User,
            bio: None,
            posts_count: 3,
            followers_count: 8,
            following_count: 0,
        }
    }

    #[tokio::test]
    async fn second_page_skips_already_held_posts() {
        let frieren = author("frieren");
        let first = post_by(&frieren, 0);
        let second = post_by(&frieren, 0);
        let third = post_by(&frieren, 0);
        let user = user_from(&frieren);

        let mut api = MockBlogApi::new();
        api.expect_get_user().returning(move |_| Ok(user.clone()));
        let page_one = vec![first.clone(), second.clone()];
        let page_two = vec![second.clone(), third.clone()];
        api.expect_list_user_posts().returning(move |_, page, limit| {
            let items = if page == 1 { page_one.clone() } else { page_two.clone() };
            Ok(Page { items, page, limit, total: 3 })
        });
        let store = ProfileStore::new(Arc::new(api), &EventBus::new(), 2);

        store.load(frieren.id).await.unwrap();
        assert!(store.load_more().await.unwrap());

        let ids: Vec<Uuid> = store.posts().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);
        // 2 * 2 >= 3
        assert!(!store.load_more().await.unwrap());
    }

    #[test]
    fn follow_and_delete_adjust_profile_counters() {
        let himmel = author("himmel");
        let p = post_by(&himmel, 0);
        let mut state = ProfileState {
            user: Some(user_from(&himmel)),
            posts: vec![p.clone()],
            total: 1,
            ..Default::default()
        };

        state.apply(&MutationEvent::AuthorSubscribed { author_id: himmel.id, subscribed: true });
        assert!(state.posts[0].is_subscribed);
        assert_eq!(state.user.as_ref().map(|u| u.followers_count), Some(9));

        state.apply(&MutationEvent::PostDeleted { post_id: p.id });
        assert!(state.posts.is_empty());
        assert_eq!(state.total, 0);
        assert_eq!(state.user.as_ref().map(|u| u.posts_count), Some(2));
    }

    #[test]
    fn resynced_follow_flag_leaves_follower_count() {
        let himmel = author("himmel");
        let mut state = ProfileState {
            user: Some(user_from(&himmel)),
            posts: vec![post_by(&himmel, 0)],
            total: 1,
            ..Default::default()
        };

        state.apply(&MutationEvent::FollowStateSynced { author_id: himmel.id, subscribed: true });

        assert!(state.posts[0].is_subscribed);
        assert_eq!(state.user.as_ref().map(|u| u.followers_count), Some(8));
    }
}
