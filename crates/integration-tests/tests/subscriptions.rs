//! Following an author is confirmed by the server before any slice changes.

use domains::{ApiError, MockBlogApi, User};
use integration_tests::{author, client, page, post};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn confirmed_follow_marks_every_post_of_the_author() {
    let himmel = author("himmel");
    let heiter = author("heiter");
    let feed = vec![post(&himmel, 0), post(&heiter, 0), post(&himmel, 3)];
    let profile_user = User {
        id: himmel.id,
        display_name: "Himmel".into(),
        username: "himmel".into(),
        avatar_url: None,
        role: Default::default(),
        bio: Some("the hero".into()),
        posts_count: 2,
        followers_count: 100,
        following_count: 0,
    };

    let mut api = MockBlogApi::new();
    let listed = feed.clone();
    api.expect_list_posts()
        .returning(move |q| Ok(page(listed.clone(), q.page, q.limit)));
    api.expect_get_user().returning(move |_| Ok(profile_user.clone()));
    let own_posts = vec![feed[0].clone(), feed[2].clone()];
    api.expect_list_user_posts()
        .returning(move |_, p, limit| Ok(page(own_posts.clone(), p, limit)));
    api.expect_subscribe().times(1).returning(|_| Ok(()));
    let client = client(api);

    client.posts.refresh().await.unwrap();
    client.profile.load(himmel.id).await.unwrap();

    assert!(assert_ok!(client.subscriptions.toggle(himmel.id).await));

    let items = client.posts.items();
    assert!(items.iter().filter(|p| p.is_by(himmel.id)).all(|p| p.is_subscribed));
    assert!(items.iter().filter(|p| p.is_by(heiter.id)).all(|p| !p.is_subscribed));
    assert!(client.profile.posts().iter().all(|p| p.is_subscribed));
    assert_eq!(client.profile.user().map(|u| u.followers_count), Some(101));
    assert!(client.subscriptions.is_following(himmel.id));
}

#[tokio::test]
async fn rejected_follow_changes_nothing() {
    let eisen = author("eisen");
    let feed = vec![post(&eisen, 0)];

    let mut api = MockBlogApi::new();
    let listed = feed.clone();
    api.expect_list_posts()
        .returning(move |q| Ok(page(listed.clone(), q.page, q.limit)));
    api.expect_subscribe()
        .returning(|_| Err(ApiError::Unauthorized("log in to follow".into())));
    let client = client(api);

    client.posts.refresh().await.unwrap();
    assert_err!(client.subscriptions.toggle(eisen.id).await);

    assert!(!client.posts.items()[0].is_subscribed);
    assert!(!client.subscriptions.is_following(eisen.id));
    assert_eq!(
        client.subscriptions.snapshot().error.as_deref(),
        Some("unauthorized: log in to follow")
    );
}

#[tokio::test]
async fn rederived_follow_flags_posts_without_inflating_followers() {
    let himmel = author("himmel");
    let own_posts = vec![post(&himmel, 0)];
    let profile_user = User {
        id: himmel.id,
        display_name: "Himmel".into(),
        username: "himmel".into(),
        avatar_url: None,
        role: Default::default(),
        bio: None,
        posts_count: 1,
        followers_count: 100,
        following_count: 0,
    };

    let mut api = MockBlogApi::new();
    api.expect_get_user().returning(move |_| Ok(profile_user.clone()));
    api.expect_list_user_posts()
        .returning(move |_, p, limit| Ok(page(own_posts.clone(), p, limit)));
    api.expect_subscription_status().returning(|_| Ok(true));
    let client = client(api);

    client.profile.load(himmel.id).await.unwrap();
    assert!(assert_ok!(client.subscriptions.check(himmel.id).await));

    assert!(client.subscriptions.is_following(himmel.id));
    assert!(client.profile.posts().iter().all(|p| p.is_subscribed));
    assert_eq!(client.profile.user().map(|u| u.followers_count), Some(100));
}

#[tokio::test]
async fn local_flag_flip_does_not_touch_the_follow_set() {
    let stark = author("stark");
    let feed = vec![post(&stark, 0)];

    let mut api = MockBlogApi::new();
    let listed = feed.clone();
    api.expect_list_posts()
        .returning(move |q| Ok(page(listed.clone(), q.page, q.limit)));
    api.expect_subscribe().never();
    let client = client(api);

    client.posts.refresh().await.unwrap();
    assert!(client.posts.toggle_subscribe(stark.id));

    assert!(client.posts.items()[0].is_subscribed);
    assert!(!client.subscriptions.is_following(stark.id));
}
