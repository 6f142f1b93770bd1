//! Responses that arrive after the view moved on are dropped.
//!
//! Each mock reaches back into the client while "in flight" to simulate the
//! user navigating away between request and response.

use std::sync::{Arc, OnceLock};

use domains::{MockBlogApi, PostFilters};
use integration_tests::{author, client, page, post};
use services::BlogClient;

type Slot = Arc<OnceLock<BlogClient>>;

fn install(slot: &Slot, api: MockBlogApi) -> &BlogClient {
    assert!(slot.set(client(api)).is_ok());
    slot.get().unwrap()
}

#[tokio::test]
async fn like_count_for_a_left_post_is_ignored() {
    let p = post(&author("frieren"), 4);
    let id = p.id;
    let slot: Slot = Arc::default();

    let mut api = MockBlogApi::new();
    api.expect_get_post().returning(move |_| Ok(p.clone()));
    let inner = slot.clone();
    api.expect_get_like_count().returning(move |_| {
        // the reader closed the detail view
        if let Some(client) = inner.get() {
            client.detail.clear();
        }
        Ok(99)
    });
    let client = install(&slot, api);

    client.detail.load_by_id(id).await.unwrap();

    assert!(client.detail.post().is_none());
}

#[tokio::test]
async fn search_results_for_a_cleared_query_are_dropped() {
    let slot: Slot = Arc::default();

    let mut api = MockBlogApi::new();
    let inner = slot.clone();
    api.expect_list_posts().returning(move |q| {
        if let Some(client) = inner.get() {
            client.search.clear();
        }
        Ok(page(vec![post(&author("fern"), 0)], q.page, q.limit))
    });
    let client = install(&slot, api);

    client.search.search("stark").await.unwrap();

    let state = client.search.snapshot();
    assert!(state.results.is_empty());
    assert!(state.query.is_empty());
}

#[tokio::test]
async fn page_for_replaced_filters_is_dropped() {
    let slot: Slot = Arc::default();

    let mut api = MockBlogApi::new();
    let inner = slot.clone();
    api.expect_list_posts().returning(move |q| {
        if let Some(client) = inner.get() {
            client.posts.set_filter(PostFilters {
                category: Some("review".into()),
                search: None,
            });
        }
        Ok(page(vec![post(&author("stark"), 0)], q.page, q.limit))
    });
    let client = install(&slot, api);

    client
        .posts
        .load_page(
            PostFilters {
                category: Some("news".into()),
                search: None,
            },
            1,
            12,
        )
        .await
        .unwrap();

    let state = client.posts.snapshot();
    assert!(state.items.is_empty());
    assert_eq!(state.filters.category.as_deref(), Some("review"));
    assert!(!state.loading);
}
