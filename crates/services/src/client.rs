//! Composition of every store around one API handle and one event bus.

use std::sync::Arc;

use domains::{BlogApi, TokenDecoder, TokenStorage};
use uuid::Uuid;

use crate::bus::EventBus;
use crate::comments::CommentStore;
use crate::detail::PostDetailStore;
use crate::posts::PostsStore;
use crate::profile::ProfileStore;
use crate::search::SearchStore;
use crate::session::SessionStore;
use crate::subscriptions::SubscriptionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    pub page_size: u32,
    pub search_limit: u32,
    pub max_comment_depth: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            page_size: 12,
            search_limit: 20,
            max_comment_depth: 3,
        }
    }
}

/// Every slice of client state, wired to a shared [`EventBus`].
pub struct BlogClient {
    api: Arc<dyn BlogApi>,
    bus: Arc<EventBus>,
    options: ClientOptions,
    pub session: SessionStore,
    pub posts: Arc<PostsStore>,
    pub detail: Arc<PostDetailStore>,
    pub search: Arc<SearchStore>,
    pub subscriptions: Arc<SubscriptionStore>,
    pub profile: Arc<ProfileStore>,
}

impl BlogClient {
    pub fn new(
        api: Arc<dyn BlogApi>,
        storage: Arc<dyn TokenStorage>,
        decoder: Arc<dyn TokenDecoder>,
        options: ClientOptions,
    ) -> Self {
        let bus = EventBus::new();
        Self {
            session: SessionStore::new(storage, decoder),
            posts: PostsStore::new(api.clone(), bus.clone(), options.page_size),
            detail: PostDetailStore::new(api.clone(), &bus),
            search: SearchStore::new(api.clone(), &bus, options.search_limit),
            subscriptions: SubscriptionStore::new(api.clone(), bus.clone()),
            profile: ProfileStore::new(api.clone(), &bus, options.page_size),
            api,
            bus,
            options,
        }
    }

    pub fn api(&self) -> &Arc<dyn BlogApi> {
        &self.api
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn options(&self) -> ClientOptions {
        self.options
    }

    /// A comment tree for `post_id`, publishing count changes on the shared bus.
    pub fn comments(&self, post_id: Uuid) -> CommentStore {
        CommentStore::new(
            self.api.clone(),
            self.bus.clone(),
            post_id,
            self.options.max_comment_depth,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockBlogApi, MockTokenDecoder, MockTokenStorage};

    #[test]
    fn every_post_slice_observes_the_bus() {
        let client = BlogClient::new(
            Arc::new(MockBlogApi::new()),
            Arc::new(MockTokenStorage::new()),
            Arc::new(MockTokenDecoder::new()),
            ClientOptions::default(),
        );
        // posts, detail, search, profile
        assert_eq!(client.bus().observer_count(), 4);
    }
}
