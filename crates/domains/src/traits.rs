//! # Core Traits (Ports)
//!
//! Adapters implement these traits; services only ever see the traits.

use async_trait::async_trait;
use secrecy::SecretString;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::{
    BookmarkOutcome, Comment, CommentDraft, CommentReaction, CommentReactionOutcome, Page, Post,
    PostDraft, PostQuery, PostReaction, ReactionOutcome, TokenIdentity, User,
};

/// Remote blog API contract. The HTTP adapter is the only production
/// implementation; tests use the mockall-generated `MockBlogApi`.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BlogApi: Send + Sync {
    // Post Operations
    async fn list_posts(&self, query: &PostQuery) -> std::result::Result<Page<Post>, ApiError>;
    async fn get_post(&self, id: Uuid) -> std::result::Result<Post, ApiError>;
    /// Live like count; the count embedded in `get_post` may be stale.
    async fn get_like_count(&self, id: Uuid) -> std::result::Result<u32, ApiError>;
    async fn create_post(&self, draft: &PostDraft) -> std::result::Result<Post, ApiError>;
    async fn update_post(&self, id: Uuid, draft: &PostDraft)
        -> std::result::Result<Post, ApiError>;
    async fn delete_post(&self, id: Uuid) -> std::result::Result<(), ApiError>;

    // Engagement
    async fn react_to_post(
        &self,
        id: Uuid,
        reaction: PostReaction,
    ) -> std::result::Result<ReactionOutcome, ApiError>;
    async fn bookmark_post(&self, id: Uuid) -> std::result::Result<BookmarkOutcome, ApiError>;
    async fn unbookmark_post(&self, id: Uuid) -> std::result::Result<BookmarkOutcome, ApiError>;
    async fn list_bookmarks(&self) -> std::result::Result<Vec<Post>, ApiError>;

    // Users & subscriptions
    async fn get_user(&self, id: Uuid) -> std::result::Result<User, ApiError>;
    async fn list_user_posts(
        &self,
        user_id: Uuid,
        page: u32,
        limit: u32,
    ) -> std::result::Result<Page<Post>, ApiError>;
    async fn subscribe(&self, author_id: Uuid) -> std::result::Result<(), ApiError>;
    async fn unsubscribe(&self, author_id: Uuid) -> std::result::Result<(), ApiError>;
    async fn subscription_status(&self, author_id: Uuid) -> std::result::Result<bool, ApiError>;
    async fn subscriber_count(&self, author_id: Uuid) -> std::result::Result<u64, ApiError>;

    // Comments
    async fn list_comments(&self, post_id: Uuid) -> std::result::Result<Vec<Comment>, ApiError>;
    async fn list_replies(&self, comment_id: Uuid)
        -> std::result::Result<Vec<Comment>, ApiError>;
    async fn create_comment(
        &self,
        post_id: Uuid,
        draft: &CommentDraft,
    ) -> std::result::Result<Comment, ApiError>;
    async fn update_comment(
        &self,
        comment_id: Uuid,
        content: &str,
    ) -> std::result::Result<Comment, ApiError>;
    async fn delete_comment(&self, comment_id: Uuid) -> std::result::Result<(), ApiError>;
    async fn react_to_comment(
        &self,
        comment_id: Uuid,
        reaction: CommentReaction,
    ) -> std::result::Result<CommentReactionOutcome, ApiError>;
}

/// Persistent home of the session token (the browser's local storage in a
/// web client). Read on every outgoing request, never cached by callers.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenStorage: Send + Sync {
    fn get_token(&self) -> Option<SecretString>;
    fn set_token(&self, token: &str) -> Result<()>;
    fn clear_token(&self) -> Result<()>;
}

/// Extracts identity and expiry from a compact token. Signatures are not
/// verified client-side; the server remains the authority.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenDecoder: Send + Sync {
    fn decode(&self, token: &str) -> Result<TokenIdentity>;
}
