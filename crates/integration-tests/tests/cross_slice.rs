//! Mutations made through one store show up in every other slice.

use domains::{ApiError, MockBlogApi, PostFilters, ReactionOutcome};
use integration_tests::{author, client, comment, page, post};
use tokio_test::assert_err;

#[tokio::test]
async fn detail_follows_feed_like_without_refetch() {
    let p = post(&author("marcille"), 10);
    let id = p.id;

    let mut api = MockBlogApi::new();
    let listed = vec![p.clone()];
    api.expect_list_posts()
        .returning(move |q| Ok(page(listed.clone(), q.page, q.limit)));
    let served = p.clone();
    api.expect_get_post().times(1).returning(move |_| Ok(served.clone()));
    api.expect_get_like_count().times(1).returning(|_| Ok(10));
    api.expect_react_to_post().returning(|_, reaction| {
        Ok(ReactionOutcome {
            is_liked: reaction.is_like,
            likes_count: if reaction.is_like { 11 } else { 10 },
        })
    });
    let client = client(api);

    client.posts.refresh().await.unwrap();
    client.detail.load_by_id(id).await.unwrap();

    client.posts.like_optimistic(id, false).await.unwrap();
    let detail = client.detail.post().unwrap();
    assert_eq!((detail.likes_count, detail.is_liked), (11, true));
    assert_eq!(client.posts.get(id).unwrap().likes_count, 11);

    client.posts.like_optimistic(id, true).await.unwrap();
    let detail = client.detail.post().unwrap();
    assert_eq!((detail.likes_count, detail.is_liked), (10, false));
}

#[tokio::test]
async fn delete_cascades_across_slices() {
    let laios = author("laios");
    let feed: Vec<_> = (0..5).map(|i| post(&laios, i)).collect();
    let target = feed[2].clone();
    let id = target.id;
    let bookmarks = vec![target.clone(), post(&laios, 9)];

    let mut api = MockBlogApi::new();
    let listed = feed.clone();
    api.expect_list_posts()
        .returning(move |q| Ok(page(listed.clone(), q.page, q.limit)));
    api.expect_list_bookmarks()
        .returning(move || Ok(bookmarks.clone()));
    let served = target.clone();
    api.expect_get_post().returning(move |_| Ok(served.clone()));
    api.expect_get_like_count().returning(|_| Ok(2));
    api.expect_delete_post().times(1).returning(|_| Ok(()));
    let client = client(api);

    client
        .posts
        .load_page(PostFilters::default(), 1, 12)
        .await
        .unwrap();
    client.posts.load_bookmarks().await.unwrap();
    client.search.search("season").await.unwrap();
    client.detail.load_by_id(id).await.unwrap();

    client.posts.delete_post(id).await.unwrap();

    let state = client.posts.snapshot();
    assert_eq!(state.items.len(), 4);
    assert_eq!(state.bookmarked.len(), 1);
    assert!(state.items.iter().chain(&state.bookmarked).all(|p| p.id != id));
    assert!(client.search.results().iter().all(|p| p.id != id));
    let detail = client.detail.snapshot();
    assert!(detail.post.is_none());
    assert!(detail.not_found);
}

#[tokio::test]
async fn new_comment_bumps_count_in_every_slice() {
    let p = post(&author("chilchuck"), 0);
    let id = p.id;

    let mut api = MockBlogApi::new();
    let listed = vec![p.clone()];
    api.expect_list_posts()
        .returning(move |q| Ok(page(listed.clone(), q.page, q.limit)));
    let served = p.clone();
    api.expect_get_post().returning(move |_| Ok(served.clone()));
    api.expect_get_like_count().returning(|_| Ok(0));
    api.expect_list_comments().returning(|_| Ok(vec![]));
    api.expect_create_comment().returning(|post_id, draft| {
        let mut created = comment(post_id, &author("senshi"));
        created.content = draft.content.clone();
        Ok(created)
    });
    let client = client(api);

    client.posts.refresh().await.unwrap();
    client.detail.load_by_id(id).await.unwrap();

    let thread = client.comments(id);
    thread.load().await.unwrap();
    thread.submit_comment("the golem farm episode").await.unwrap();

    assert_eq!(client.posts.get(id).unwrap().comments_count, 1);
    assert_eq!(client.detail.post().unwrap().comments_count, 1);
    assert_eq!(thread.snapshot().roots.len(), 1);
}

#[tokio::test]
async fn rejected_bookmark_restores_flag_and_list() {
    let p = post(&author("izutsumi"), 0);
    let id = p.id;

    let mut api = MockBlogApi::new();
    let listed = vec![p.clone()];
    api.expect_list_posts()
        .returning(move |q| Ok(page(listed.clone(), q.page, q.limit)));
    api.expect_bookmark_post()
        .returning(|_| Err(ApiError::Server { status: 502, message: "bad gateway".into() }));
    let client = client(api);

    client.posts.refresh().await.unwrap();
    assert_err!(client.posts.bookmark_optimistic(id, false).await);

    assert!(!client.posts.get(id).unwrap().is_bookmarked);
    assert!(client.posts.bookmarked().is_empty());
}
