//! # Post Detail Store
//!
//! The single post currently being viewed. Fetched on its own (a direct
//! link need not pass through the feed) and kept in step with every other
//! slice through the event bus.

use std::sync::{Arc, Weak};

use domains::{AppError, BlogApi, MutationEvent, Post, Result};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::bus::{EventBus, MutationObserver};
use crate::sync;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailState {
    pub post: Option<Post>,
    pub loading: bool,
    pub error: Option<String>,
    /// Set when the held post was deleted or the server answered 404.
    pub not_found: bool,
    /// Id of the most recent `load_by_id`; older responses are dropped.
    pub requested: Option<Uuid>,
}

impl DetailState {
    pub fn held_id(&self) -> Option<Uuid> {
        self.post.as_ref().map(|p| p.id)
    }

    /// Applies a late like-count only if `post_id` is still the held post.
    /// Returns `false` for a stale result, which is then dropped.
    pub fn apply_like_count(&mut self, post_id: Uuid, count: u32) -> bool {
        match self.post.as_mut() {
            Some(post) if post.id == post_id => {
                post.likes_count = count;
                true
            }
            _ => false,
        }
    }

    pub fn apply(&mut self, event: &MutationEvent) {
        if let MutationEvent::PostDeleted { post_id } = event {
            if self.held_id() == Some(*post_id) {
                self.post = None;
                self.not_found = true;
            }
            return;
        }
        if let Some(post) = self.post.as_mut() {
            sync::apply_to_post(post, event);
        }
    }
}

pub struct PostDetailStore {
    api: Arc<dyn BlogApi>,
    state: Mutex<DetailState>,
}

impl PostDetailStore {
    pub fn new(api: Arc<dyn BlogApi>, bus: &EventBus) -> Arc<Self> {
        let store = Arc::new(Self {
            api,
            state: Mutex::new(DetailState::default()),
        });
        let weak = Arc::downgrade(&store);
        let observer: Weak<dyn MutationObserver> = weak;
        bus.subscribe(observer);
        store
    }

    pub fn snapshot(&self) -> DetailState {
        self.state.lock().clone()
    }

    pub fn post(&self) -> Option<Post> {
        self.state.lock().post.clone()
    }

    /// Leaves the detail view.
    pub fn clear(&self) {
        *self.state.lock() = DetailState::default();
    }

    /// Fetches the post, then refreshes its like count from the dedicated
    /// endpoint. The count is dropped if another post was loaded (or the
    /// view was cleared) in the meantime.
    #[instrument(skip(self))]
    pub async fn load_by_id(&self, post_id: Uuid) -> Result<()> {
        {
            let mut state = self.state.lock();
            state.loading = true;
            state.error = None;
            state.not_found = false;
            state.requested = Some(post_id);
        }

        let post = match self.api.get_post(post_id).await {
            Ok(post) => post,
            Err(err) => {
                warn!(error = %err, "post fetch failed");
                let mut state = self.state.lock();
                if state.requested != Some(post_id) {
                    debug!("superseded fetch failed; ignoring");
                    return Ok(());
                }
                state.loading = false;
                state.not_found = err.is_not_found();
                let err = AppError::from(err);
                state.error = Some(err.to_string());
                return Err(err);
            }
        };
        {
            let mut state = self.state.lock();
            if state.requested != Some(post_id) {
                debug!(requested = ?state.requested, "superseded post response dropped");
                return Ok(());
            }
            state.post = Some(post);
            state.loading = false;
        }
        info!("post loaded");

        match self.api.get_like_count(post_id).await {
            Ok(count) => {
                let applied = self.state.lock().apply_like_count(post_id, count);
                if !applied {
                    debug!("stale like count dropped");
                }
            }
            // the embedded count stays; nothing for the reader to act on
            Err(err) => debug!(error = %err, "like count refresh failed"),
        }
        Ok(())
    }
}

impl MutationObserver for PostDetailStore {
    fn observe(&self, event: &MutationEvent) {
        self.state.lock().apply(event);
    }
}
