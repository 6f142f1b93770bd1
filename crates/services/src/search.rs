//! # Search Store
//!
//! One bounded page of results for an explicit query, separate from the
//! feed's filter-driven list. Mirrors mutation events like the detail store.

use std::sync::{Arc, Weak};

use domains::{AppError, BlogApi, MutationEvent, Post, PostFilters, PostQuery, Result};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::bus::{EventBus, MutationObserver};
use crate::sync;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// Query of the most recent search; responses for older queries are dropped.
    pub query: String,
    pub results: Vec<Post>,
    pub total: u64,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct SearchStore {
    api: Arc<dyn BlogApi>,
    limit: u32,
    state: Mutex<SearchState>,
}

impl SearchStore {
    pub fn new(api: Arc<dyn BlogApi>, bus: &EventBus, limit: u32) -> Arc<Self> {
        let store = Arc::new(Self {
            api,
            limit,
            state: Mutex::new(SearchState::default()),
        });
        let weak = Arc::downgrade(&store);
        let observer: Weak<dyn MutationObserver> = weak;
        bus.subscribe(observer);
        store
    }

    pub fn snapshot(&self) -> SearchState {
        self.state.lock().clone()
    }

    pub fn results(&self) -> Vec<Post> {
        self.state.lock().results.clone()
    }

    pub fn clear(&self) {
        *self.state.lock() = SearchState::default();
    }

    /// Runs `query`. A blank query clears results without a request.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<()> {
        let query = query.trim().to_string();
        if query.is_empty() {
            self.clear();
            return Ok(());
        }
        {
            let mut state = self.state.lock();
            state.query = query.clone();
            state.loading = true;
            state.error = None;
        }

        let filters = PostFilters {
            category: None,
            search: Some(query.clone()),
        };
        let result = self
            .api
            .list_posts(&PostQuery::new(&filters, 1, self.limit))
            .await;

        let mut state = self.state.lock();
        if state.query != query {
            debug!(active = %state.query, "result for superseded query dropped");
            return Ok(());
        }
        state.loading = false;
        match result {
            Ok(page) => {
                info!(hits = page.items.len(), total = page.total, "search complete");
                state.total = page.total;
                state.results = page.items;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "search failed");
                let err = AppError::from(err);
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }
}

impl MutationObserver for SearchStore {
    fn observe(&self, event: &MutationEvent) {
        let mut state = self.state.lock();
        if sync::apply_to_list(&mut state.results, event) > 0 {
            if let MutationEvent::PostDeleted { .. } = event {
                state.total = state.total.saturating_sub(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::fixtures::post;
    use domains::{MockBlogApi, Page};

    #[tokio::test]
    async fn blank_query_makes_no_request() {
        let store = SearchStore::new(Arc::new(MockBlogApi::new()), &EventBus::new(), 20);
        store.search("   ").await.unwrap();
        assert!(store.results().is_empty());
    }

    #[tokio::test]
    async fn results_follow_mutations_published_elsewhere() {
        let hit = post(2);
        let id = hit.id;
        let served = vec![hit.clone(), post(0)];
        let mut api = MockBlogApi::new();
        api.expect_list_posts()
            .withf(|q| q.search.as_deref() == Some("frieren") && q.page == 1 && q.limit == 20)
            .returning(move |_| Ok(Page { items: served.clone(), page: 1, limit: 20, total: 2 }));
        let bus = EventBus::new();
        let store = SearchStore::new(Arc::new(api), &bus, 20);

        store.search(" frieren ").await.unwrap();
        bus.publish(MutationEvent::LikeToggled { post_id: id });
        assert_eq!(store.results()[0].likes_count, 3);

        bus.publish(MutationEvent::PostDeleted { post_id: id });
        let state = store.snapshot();
        assert_eq!(state.results.len(), 1);
        assert_eq!(state.total, 1);
    }
}
