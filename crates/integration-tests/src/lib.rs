//! Shared fixtures for the cross-crate scenario tests under `tests/`.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use domains::{
    AuthorSnapshot, Comment, MockBlogApi, MockTokenDecoder, MockTokenStorage, Page, Post,
    PostStatus, Role, Visibility,
};
use services::{BlogClient, ClientOptions};
use uuid::Uuid;

pub fn author(username: &str) -> AuthorSnapshot {
    AuthorSnapshot {
        id: Uuid::new_v4(),
        display_name: username.to_string(),
        username: username.to_string(),
        avatar_url: None,
        role: Role::User,
        followers_count: 0,
    }
}

pub fn post(author: &AuthorSnapshot, likes: u32) -> Post {
    Post {
        id: Uuid::new_v4(),
        title: "Spring 2024 season wrap-up".into(),
        content: "Dungeon Meshi carried the season.".into(),
        category: "season".into(),
        tags: vec![],
        likes_count: likes,
        comments_count: 0,
        views_count: 0,
        is_liked: false,
        is_bookmarked: false,
        is_subscribed: false,
        author: author.clone(),
        published_at: None,
        created_at: Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap(),
        read_time_minutes: None,
        status: PostStatus::Published,
        visibility: Visibility::Public,
    }
}

pub fn comment(post_id: Uuid, author: &AuthorSnapshot) -> Comment {
    Comment {
        id: Uuid::new_v4(),
        post_id,
        content: "Marcille best girl".into(),
        author: author.clone(),
        created_at: Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap(),
        is_edited: false,
        edited_at: None,
        likes: 0,
        dislikes: 0,
        is_liked: false,
        is_disliked: false,
        is_pinned: false,
        parent_id: None,
        replies: None,
        reply_count: 0,
    }
}

pub fn page(items: Vec<Post>, page: u32, limit: u32) -> Page<Post> {
    let total = items.len() as u64;
    Page { items, page, limit, total }
}

/// A client over `api` with an anonymous session.
pub fn client(api: MockBlogApi) -> BlogClient {
    let mut storage = MockTokenStorage::new();
    storage.expect_get_token().returning(|| None);
    BlogClient::new(
        Arc::new(api),
        Arc::new(storage),
        Arc::new(MockTokenDecoder::new()),
        ClientOptions::default(),
    )
}
