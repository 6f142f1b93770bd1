//! # HttpBlogApi
//!
//! `reqwest`-backed implementation of [`BlogApi`]. Every request carries the
//! stored token (read fresh each time) and is bounded by one timeout.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domains::{
    ApiError, BlogApi, BookmarkOutcome, Comment, CommentDraft, CommentReaction,
    CommentReactionOutcome, Page, Post, PostDraft, PostQuery, PostReaction, ReactionOutcome,
    TokenStorage, User,
};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::envelope::{classify_status, classify_transport, unwrap_envelope};

#[derive(Debug, Deserialize)]
struct Count {
    count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionStatus {
    is_subscribed: bool,
}

pub struct HttpBlogApi {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStorage>,
}

impl HttpBlogApi {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        tokens: Arc<dyn TokenStorage>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Connectivity(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, self.url(path))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");
        match self.tokens.get_token() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Sends and returns the raw success body, classified on failure.
    async fn execute(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await.map_err(|e| classify_transport(&e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| classify_transport(&e))?;
        if !status.is_success() {
            return Err(classify_status(
                status.as_u16(),
                &body,
                status.canonical_reason(),
            ));
        }
        Ok(body)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let body = self.execute(builder).await?;
        let value: Value = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))?
        };
        serde_json::from_value(unwrap_envelope(value))
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// For endpoints whose body carries nothing the caller needs.
    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.execute(builder).await.map(|_| ())
    }
}

#[async_trait]
impl BlogApi for HttpBlogApi {
    #[instrument(skip(self))]
    async fn list_posts(&self, query: &PostQuery) -> Result<Page<Post>, ApiError> {
        let page: Page<Post> = self
            .send(self.request(Method::GET, "/posts").query(query))
            .await?;
        debug!(received = page.items.len(), total = page.total, "posts listed");
        Ok(page)
    }

    async fn get_post(&self, post_id: Uuid) -> Result<Post, ApiError> {
        self.send(self.request(Method::GET, &format!("/posts/{post_id}")))
            .await
    }

    async fn get_like_count(&self, post_id: Uuid) -> Result<u32, ApiError> {
        let count: Count = self
            .send(self.request(Method::GET, &format!("/posts/{post_id}/likes/count")))
            .await?;
        u32::try_from(count.count).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    #[instrument(skip(self, draft))]
    async fn create_post(&self, draft: &PostDraft) -> Result<Post, ApiError> {
        self.send(self.request(Method::POST, "/posts").json(draft))
            .await
    }

    #[instrument(skip(self, draft))]
    async fn update_post(&self, post_id: Uuid, draft: &PostDraft) -> Result<Post, ApiError> {
        self.send(
            self.request(Method::PUT, &format!("/posts/{post_id}"))
                .json(draft),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, post_id: Uuid) -> Result<(), ApiError> {
        self.send_empty(self.request(Method::DELETE, &format!("/posts/{post_id}")))
            .await
    }

    async fn react_to_post(
        &self,
        post_id: Uuid,
        reaction: PostReaction,
    ) -> Result<ReactionOutcome, ApiError> {
        self.send(
            self.request(Method::POST, &format!("/posts/{post_id}/reactions"))
                .json(&reaction),
        )
        .await
    }

    async fn bookmark_post(&self, post_id: Uuid) -> Result<BookmarkOutcome, ApiError> {
        self.send(self.request(Method::POST, &format!("/posts/{post_id}/bookmark")))
            .await
    }

    async fn unbookmark_post(&self, post_id: Uuid) -> Result<BookmarkOutcome, ApiError> {
        self.send(self.request(Method::DELETE, &format!("/posts/{post_id}/bookmark")))
            .await
    }

    async fn list_bookmarks(&self) -> Result<Vec<Post>, ApiError> {
        self.send(self.request(Method::GET, "/bookmarks")).await
    }

    async fn get_user(&self, user_id: Uuid) -> Result<User, ApiError> {
        self.send(self.request(Method::GET, &format!("/users/{user_id}")))
            .await
    }

    async fn list_user_posts(
        &self,
        user_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<Page<Post>, ApiError> {
        self.send(
            self.request(Method::GET, &format!("/users/{user_id}/posts"))
                .query(&[("page", page), ("limit", limit)]),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn subscribe(&self, author_id: Uuid) -> Result<(), ApiError> {
        self.send_empty(self.request(Method::POST, &format!("/subscriptions/{author_id}")))
            .await
    }

    #[instrument(skip(self))]
    async fn unsubscribe(&self, author_id: Uuid) -> Result<(), ApiError> {
        self.send_empty(self.request(Method::DELETE, &format!("/subscriptions/{author_id}")))
            .await
    }

    async fn subscription_status(&self, author_id: Uuid) -> Result<bool, ApiError> {
        let status: SubscriptionStatus = self
            .send(self.request(Method::GET, &format!("/subscriptions/{author_id}/status")))
            .await?;
        Ok(status.is_subscribed)
    }

    async fn subscriber_count(&self, author_id: Uuid) -> Result<u64, ApiError> {
        let count: Count = self
            .send(self.request(Method::GET, &format!("/subscriptions/{author_id}/count")))
            .await?;
        Ok(count.count)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>, ApiError> {
        self.send(self.request(Method::GET, &format!("/posts/{post_id}/comments")))
            .await
    }

    async fn list_replies(&self, comment_id: Uuid) -> Result<Vec<Comment>, ApiError> {
        self.send(self.request(Method::GET, &format!("/comments/{comment_id}/replies")))
            .await
    }

    #[instrument(skip(self, draft))]
    async fn create_comment(
        &self,
        post_id: Uuid,
        draft: &CommentDraft,
    ) -> Result<Comment, ApiError> {
        self.send(
            self.request(Method::POST, &format!("/posts/{post_id}/comments"))
                .json(draft),
        )
        .await
    }

    #[instrument(skip(self, content))]
    async fn update_comment(&self, comment_id: Uuid, content: &str) -> Result<Comment, ApiError> {
        self.send(
            self.request(Method::PUT, &format!("/comments/{comment_id}"))
                .json(&json!({ "content": content })),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn delete_comment(&self, comment_id: Uuid) -> Result<(), ApiError> {
        self.send_empty(self.request(Method::DELETE, &format!("/comments/{comment_id}")))
            .await
    }

    async fn react_to_comment(
        &self,
        comment_id: Uuid,
        reaction: CommentReaction,
    ) -> Result<CommentReactionOutcome, ApiError> {
        self.send(
            self.request(Method::POST, &format!("/comments/{comment_id}/reactions"))
                .json(&json!({ "kind": reaction })),
        )
        .await
    }
}
