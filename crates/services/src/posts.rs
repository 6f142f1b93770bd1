//! # Post Collection Store
//!
//! The paginated, filterable feed plus the viewer's bookmark list.
//! Engagement toggles are optimistic and go through the [`EventBus`], so the
//! detail, search and profile slices see every change this store makes.

use std::sync::{Arc, Weak};

use domains::{
    AppError, BlogApi, BookmarkOutcome, MutationEvent, Page, Post, PostDraft, PostFilters,
    PostQuery, PostReaction, PostStatus, ReactionOutcome, Result,
};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::bus::{EventBus, MutationObserver};
use crate::optimistic::Optimistic;
use crate::sync;

/// Plain state of the collection slice. All transitions are synchronous.
#[derive(Debug, Clone, PartialEq)]
pub struct PostsState {
    pub items: Vec<Post>,
    /// Posts the viewer bookmarked; kept consistent with `items` flags.
    pub bookmarked: Vec<Post>,
    pub filters: PostFilters,
    /// Last page merged into `items`; 0 before the first load.
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub has_more: bool,
    pub loading: bool,
    pub bookmarks_loading: bool,
    pub error: Option<String>,
}

impl PostsState {
    pub fn new(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            bookmarked: Vec::new(),
            filters: PostFilters::default(),
            page: 0,
            page_size,
            total: 0,
            has_more: true,
            loading: false,
            bookmarks_loading: false,
            error: None,
        }
    }

    /// Merges filters and resets pagination; the caller reloads page 1.
    pub fn set_filter(&mut self, patch: PostFilters) {
        let before = self.filters.clone();
        self.filters.merge(patch);
        if self.filters != before {
            // whatever page is in flight belongs to the old filters
            self.loading = false;
        }
        self.items.clear();
        self.page = 0;
        self.total = 0;
        self.has_more = true;
        self.error = None;
    }

    /// Page 1 replaces; later pages append only unseen ids.
    pub fn merge_page(&mut self, requested: u32, page: Page<Post>) {
        let has_more = page.has_more();
        if requested <= 1 {
            self.items = page.items;
        } else {
            sync::append_unseen(&mut self.items, page.items);
        }
        self.page = requested;
        self.total = page.total;
        self.has_more = has_more;
        self.loading = false;
        self.error = None;
    }

    pub fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }

    pub fn find(&self, post_id: Uuid) -> Option<&Post> {
        self.items
            .iter()
            .chain(self.bookmarked.iter())
            .find(|p| p.id == post_id)
    }

    pub fn apply(&mut self, event: &MutationEvent) {
        match event {
            MutationEvent::PostCreated { post } => {
                if post.status == PostStatus::Published && self.find(post.id).is_none() {
                    self.items.insert(0, (**post).clone());
                    self.total += 1;
                }
            }
            MutationEvent::PostDeleted { .. } => {
                if sync::apply_to_list(&mut self.items, event) > 0 {
                    self.total = self.total.saturating_sub(1);
                }
                sync::apply_to_list(&mut self.bookmarked, event);
            }
            MutationEvent::BookmarkToggled { post_id } => {
                let flipped = self
                    .items
                    .iter_mut()
                    .filter(|p| p.id == *post_id)
                    .map(|p| {
                        p.toggle_bookmark();
                        p.is_bookmarked
                    })
                    .last();
                // a post only on the bookmarks page toggles from its own copy
                let now = flipped.or_else(|| {
                    self.bookmarked
                        .iter()
                        .find(|p| p.id == *post_id)
                        .map(|p| !p.is_bookmarked)
                });
                if let Some(now) = now {
                    self.set_bookmark_membership(*post_id, now);
                }
            }
            MutationEvent::BookmarkConfirmed {
                post_id,
                is_bookmarked,
            } => {
                sync::apply_to_list(&mut self.items, event);
                self.set_bookmark_membership(*post_id, *is_bookmarked);
            }
            _ => {
                sync::apply_to_list(&mut self.items, event);
                sync::apply_to_list(&mut self.bookmarked, event);
            }
        }
    }

    fn set_bookmark_membership(&mut self, post_id: Uuid, bookmarked: bool) {
        if !bookmarked {
            self.bookmarked.retain(|p| p.id != post_id);
            return;
        }
        if let Some(held) = self.bookmarked.iter_mut().find(|p| p.id == post_id) {
            held.is_bookmarked = true;
        } else if let Some(source) = self.items.iter().find(|p| p.id == post_id) {
            let mut copy = source.clone();
            copy.is_bookmarked = true;
            self.bookmarked.insert(0, copy);
        }
    }
}

pub struct PostsStore {
    api: Arc<dyn BlogApi>,
    bus: Arc<EventBus>,
    state: Mutex<PostsState>,
}

impl PostsStore {
    /// Creates the store and registers it on `bus`.
    pub fn new(api: Arc<dyn BlogApi>, bus: Arc<EventBus>, page_size: u32) -> Arc<Self> {
        let store = Arc::new(Self {
            api,
            bus: bus.clone(),
            state: Mutex::new(PostsState::new(page_size)),
        });
        let weak = Arc::downgrade(&store);
        let observer: Weak<dyn MutationObserver> = weak;
        bus.subscribe(observer);
        store
    }

    pub fn snapshot(&self) -> PostsState {
        self.state.lock().clone()
    }

    pub fn items(&self) -> Vec<Post> {
        self.state.lock().items.clone()
    }

    pub fn bookmarked(&self) -> Vec<Post> {
        self.state.lock().bookmarked.clone()
    }

    pub fn get(&self, post_id: Uuid) -> Option<Post> {
        self.state.lock().find(post_id).cloned()
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    pub fn set_filter(&self, patch: PostFilters) {
        self.state.lock().set_filter(patch);
    }

    /// Fetches `page` for `filters`. Errors are stored for display and also
    /// returned; already loaded pages stay in place.
    #[instrument(skip(self, filters), fields(category = ?filters.category, search = ?filters.search))]
    pub async fn load_page(&self, filters: PostFilters, page: u32, page_size: u32) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.filters != filters {
                // new filter set: the held pages no longer apply
                state.items.clear();
                state.page = 0;
                state.filters = filters.clone();
            }
            state.page_size = page_size;
            state.loading = true;
            state.error = None;
        }
        self.fetch_page(filters, page, page_size).await
    }

    /// Reloads page 1 with the active filters.
    pub async fn refresh(&self) -> Result<()> {
        let (filters, size) = {
            let state = self.state.lock();
            (state.filters.clone(), state.page_size)
        };
        self.load_page(filters, 1, size).await
    }

    /// Infinite-scroll trigger. Returns `false` without fetching while a
    /// fetch is in flight or when the feed is exhausted.
    pub async fn load_next_page(&self) -> Result<bool> {
        let (filters, next, size) = {
            let mut state = self.state.lock();
            if state.loading || !state.has_more {
                debug!(loading = state.loading, has_more = state.has_more, "next page skipped");
                return Ok(false);
            }
            state.loading = true;
            state.error = None;
            (state.filters.clone(), state.page + 1, state.page_size)
        };
        self.fetch_page(filters, next, size).await.map(|_| true)
    }

    async fn fetch_page(&self, filters: PostFilters, page: u32, page_size: u32) -> Result<()> {
        let query = PostQuery::new(&filters, page, page_size);
        let result = self.api.list_posts(&query).await;

        let mut state = self.state.lock();
        if state.filters != filters {
            // `loading` now belongs to whichever load set the new filters
            debug!(page, "filters changed while page was in flight; dropping result");
            return Ok(());
        }
        match result {
            Ok(fetched) => {
                info!(page, received = fetched.items.len(), total = fetched.total, "page loaded");
                state.merge_page(page, fetched);
                Ok(())
            }
            Err(err) => {
                warn!(page, error = %err, "page load failed");
                let err = AppError::from(err);
                state.fail(err.to_string());
                Err(err)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn load_bookmarks(&self) -> Result<()> {
        self.state.lock().bookmarks_loading = true;
        let result = self.api.list_bookmarks().await;

        let mut state = self.state.lock();
        state.bookmarks_loading = false;
        match result {
            Ok(mut posts) => {
                for post in &mut posts {
                    post.is_bookmarked = true;
                }
                state.bookmarked = posts;
                Ok(())
            }
            Err(err) => {
                let err = AppError::from(err);
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Local optimistic flip of the like flag and count.
    pub fn toggle_like(&self, post_id: Uuid) {
        self.bus.publish(MutationEvent::LikeToggled { post_id });
    }

    /// Asks the server for the inverse of `currently_liked` and reconciles
    /// every slice to the returned state. Does not roll back on failure.
    #[instrument(skip(self))]
    pub async fn like(&self, post_id: Uuid, currently_liked: bool) -> Result<ReactionOutcome> {
        let reaction = PostReaction {
            is_like: !currently_liked,
        };
        let outcome = self.api.react_to_post(post_id, reaction).await?;
        self.bus.publish(MutationEvent::LikeConfirmed {
            post_id,
            is_liked: outcome.is_liked,
            likes_count: outcome.likes_count,
        });
        Ok(outcome)
    }

    /// Toggle, send, then reconcile or roll back.
    pub async fn like_optimistic(
        &self,
        post_id: Uuid,
        currently_liked: bool,
    ) -> Result<ReactionOutcome> {
        Optimistic::like(post_id)
            .run(|e| self.bus.publish(e), self.like(post_id, currently_liked))
            .await
    }

    pub fn toggle_bookmark(&self, post_id: Uuid) {
        self.bus.publish(MutationEvent::BookmarkToggled { post_id });
    }

    #[instrument(skip(self))]
    pub async fn bookmark(&self, post_id: Uuid, currently_bookmarked: bool) -> Result<BookmarkOutcome> {
        let outcome = if currently_bookmarked {
            self.api.unbookmark_post(post_id).await?
        } else {
            self.api.bookmark_post(post_id).await?
        };
        self.bus.publish(MutationEvent::BookmarkConfirmed {
            post_id,
            is_bookmarked: outcome.is_bookmarked,
        });
        Ok(outcome)
    }

    pub async fn bookmark_optimistic(
        &self,
        post_id: Uuid,
        currently_bookmarked: bool,
    ) -> Result<BookmarkOutcome> {
        Optimistic::bookmark(post_id)
            .run(|e| self.bus.publish(e), self.bookmark(post_id, currently_bookmarked))
            .await
    }

    /// Flips `is_subscribed` on every held post by `author_id`.
    /// Returns the new state.
    pub fn toggle_subscribe(&self, author_id: Uuid) -> bool {
        let subscribed = {
            let state = self.state.lock();
            !state
                .items
                .iter()
                .chain(state.bookmarked.iter())
                .find(|p| p.is_by(author_id))
                .is_some_and(|p| p.is_subscribed)
        };
        self.bus.publish(MutationEvent::FollowStateSynced {
            author_id,
            subscribed,
        });
        subscribed
    }

    /// Deletes on the server, then removes the post from every slice.
    #[instrument(skip(self))]
    pub async fn delete_post(&self, post_id: Uuid) -> Result<()> {
        if let Err(err) = self.api.delete_post(post_id).await {
            warn!(error = %err, "delete failed");
            let err = AppError::from(err);
            self.state.lock().error = Some(err.to_string());
            return Err(err);
        }
        info!("post deleted");
        self.bus.publish(MutationEvent::PostDeleted { post_id });
        Ok(())
    }

    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create_post(&self, draft: &PostDraft) -> Result<Post> {
        draft.validate()?;
        match self.api.create_post(draft).await {
            Ok(post) => {
                info!(post_id = %post.id, status = ?post.status, "post created");
                self.bus.publish(MutationEvent::PostCreated {
                    post: Box::new(post.clone()),
                });
                Ok(post)
            }
            Err(err) => {
                let err = AppError::from(err);
                self.state.lock().error = Some(err.to_string());
                Err(err)
            }
        }
    }

    #[instrument(skip(self, draft))]
    pub async fn update_post(&self, post_id: Uuid, draft: &PostDraft) -> Result<Post> {
        draft.validate()?;
        match self.api.update_post(post_id, draft).await {
            Ok(post) => {
                self.bus.publish(MutationEvent::PostUpdated {
                    post: Box::new(post.clone()),
                });
                Ok(post)
            }
            Err(err) => {
                let err = AppError::from(err);
                self.state.lock().error = Some(err.to_string());
                Err(err)
            }
        }
    }
}

impl MutationObserver for PostsStore {
    fn observe(&self, event: &MutationEvent) {
        self.state.lock().apply(event);
    }
}
