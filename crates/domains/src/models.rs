//! # Domain Models
//!
//! These structs mirror the JSON the blog API exchanges with the client.
//! Posts and comments embed an [`AuthorSnapshot`], a copy of the author taken
//! at fetch time, so profile edits do not reach already loaded lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Reading speed used when the server does not send a read time.
pub const WORDS_PER_MINUTE: usize = 200;

pub const TITLE_MIN_LEN: usize = 3;
pub const TITLE_MAX_LEN: usize = 150;
pub const CONTENT_MIN_LEN: usize = 10;
pub const COMMENT_MAX_LEN: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    /// Moderators and admins may delete content they do not own.
    pub fn can_moderate(self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }
}

/// A registered account. Authoritative at the session/profile layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    /// Handle used for `@mentions`
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub posts_count: u64,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
}

/// Denormalized author identity embedded in posts and comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSnapshot {
    pub id: Uuid,
    pub display_name: String,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// Follower count as of the fetch; may lag the subscription cache.
    #[serde(default)]
    pub followers_count: u64,
}

impl From<&User> for AuthorSnapshot {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            username: user.username.clone(),
            avatar_url: user.avatar_url.clone(),
            role: user.role,
            followers_count: user.followers_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PostStatus {
    Draft,
    #[default]
    Published,
    Scheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Followers,
}

/// The fundamental unit of the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub comments_count: u32,
    #[serde(default)]
    pub views_count: u64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_bookmarked: bool,
    /// Whether the viewer follows this post's author
    #[serde(default)]
    pub is_subscribed: bool,
    pub author: AuthorSnapshot,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read_time_minutes: Option<u32>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub visibility: Visibility,
}

impl Post {
    /// Minutes to read, preferring the server's figure.
    pub fn read_time(&self) -> u32 {
        self.read_time_minutes
            .unwrap_or_else(|| estimate_read_time(&self.content))
    }

    /// Flips `is_liked` and moves `likes_count` by exactly one.
    pub fn toggle_like(&mut self) {
        if self.is_liked {
            self.is_liked = false;
            self.likes_count = self.likes_count.saturating_sub(1);
        } else {
            self.is_liked = true;
            self.likes_count = self.likes_count.saturating_add(1);
        }
    }

    pub fn toggle_bookmark(&mut self) {
        self.is_bookmarked = !self.is_bookmarked;
    }

    pub fn is_by(&self, author_id: Uuid) -> bool {
        self.author.id == author_id
    }
}

pub fn estimate_read_time(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}

/// A comment or reply under a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub author: AuthorSnapshot,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_edited: bool,
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub dislikes: u32,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_disliked: bool,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    /// Replies the server chose to embed; `None` means "not fetched".
    #[serde(default)]
    pub replies: Option<Vec<Comment>>,
    #[serde(default)]
    pub reply_count: u32,
}

impl Comment {
    /// Popularity used by the `popular` sort.
    pub fn score(&self) -> i64 {
        i64::from(self.likes) - i64::from(self.dislikes)
    }

    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Liking clears a prior dislike; liking twice removes the like.
    pub fn toggle_like(&mut self) {
        if self.is_liked {
            self.is_liked = false;
            self.likes = self.likes.saturating_sub(1);
        } else {
            self.is_liked = true;
            self.likes = self.likes.saturating_add(1);
            if self.is_disliked {
                self.is_disliked = false;
                self.dislikes = self.dislikes.saturating_sub(1);
            }
        }
    }

    /// Mirror image of [`Comment::toggle_like`].
    pub fn toggle_dislike(&mut self) {
        if self.is_disliked {
            self.is_disliked = false;
            self.dislikes = self.dislikes.saturating_sub(1);
        } else {
            self.is_disliked = true;
            self.dislikes = self.dislikes.saturating_add(1);
            if self.is_liked {
                self.is_liked = false;
                self.likes = self.likes.saturating_sub(1);
            }
        }
    }

    pub fn apply_reaction(&mut self, outcome: &CommentReactionOutcome) {
        self.likes = outcome.likes;
        self.dislikes = outcome.dislikes;
        self.is_liked = outcome.is_liked;
        self.is_disliked = outcome.is_disliked;
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        u64::from(self.page) * u64::from(self.limit) < self.total
    }
}

/// Active feed filters. An empty string in a merge clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFilters {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl PostFilters {
    pub fn merge(&mut self, patch: PostFilters) {
        if let Some(category) = patch.category {
            self.category = non_blank(category);
        }
        if let Some(search) = patch.search {
            self.search = non_blank(search);
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Query string for `GET /posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
}

impl PostQuery {
    pub fn new(filters: &PostFilters, page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            category: filters.category.clone(),
            search: filters.search.clone(),
            status: None,
        }
    }
}

/// Authoring payload for create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
}

impl PostDraft {
    /// Form checks run before any network call.
    pub fn validate(&self) -> Result<()> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::validation("title", "title is required"));
        }
        let title_len = title.chars().count();
        if title_len < TITLE_MIN_LEN {
            return Err(AppError::validation(
                "title",
                format!("title must be at least {TITLE_MIN_LEN} characters"),
            ));
        }
        if title_len > TITLE_MAX_LEN {
            return Err(AppError::validation(
                "title",
                format!("title must be at most {TITLE_MAX_LEN} characters"),
            ));
        }
        if self.content.trim().chars().count() < CONTENT_MIN_LEN {
            return Err(AppError::validation(
                "content",
                format!("content must be at least {CONTENT_MIN_LEN} characters"),
            ));
        }
        if self.category.trim().is_empty() {
            return Err(AppError::validation("category", "category is required"));
        }
        if self.status == PostStatus::Scheduled && self.scheduled_for.is_none() {
            return Err(AppError::validation(
                "scheduledFor",
                "a scheduled post needs a publication date",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDraft {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
}

impl CommentDraft {
    pub fn validate(&self) -> Result<()> {
        let content = self.content.trim();
        if content.is_empty() {
            return Err(AppError::validation("content", "comment cannot be empty"));
        }
        if content.chars().count() > COMMENT_MAX_LEN {
            return Err(AppError::validation(
                "content",
                format!("comment must be at most {COMMENT_MAX_LEN} characters"),
            ));
        }
        Ok(())
    }
}

/// Body of `POST /posts/{id}/reactions`. `is_like: false` withdraws a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostReaction {
    pub is_like: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionOutcome {
    pub is_liked: bool,
    pub likes_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkOutcome {
    pub is_bookmarked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommentReaction {
    Like,
    Dislike,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentReactionOutcome {
    pub likes: u32,
    pub dislikes: u32,
    pub is_liked: bool,
    pub is_disliked: bool,
}

/// Identity carried by the session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    pub subject: String,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl TokenIdentity {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
