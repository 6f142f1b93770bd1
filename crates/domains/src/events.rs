//! # Mutation Events
//!
//! Typed signals emitted when engagement or lifecycle state of a post
//! changes. Every store holding post copies applies them to matching ids.

use uuid::Uuid;

use crate::models::Post;

#[derive(Debug, Clone, PartialEq)]
pub enum MutationEvent {
    /// Optimistic like flip; each holder flips its own copy.
    LikeToggled { post_id: Uuid },
    /// Server-confirmed like state; holders overwrite flag and count.
    LikeConfirmed {
        post_id: Uuid,
        is_liked: bool,
        likes_count: u32,
    },
    /// Optimistic bookmark flip
    BookmarkToggled { post_id: Uuid },
    BookmarkConfirmed { post_id: Uuid, is_bookmarked: bool },
    /// Server-confirmed follow or unfollow; follower counters move with it.
    AuthorSubscribed { author_id: Uuid, subscribed: bool },
    /// Follow flag re-derived from the server or flipped locally.
    /// Only `is_subscribed` changes; counters stay as the server reported.
    FollowStateSynced { author_id: Uuid, subscribed: bool },
    PostCreated { post: Box<Post> },
    PostUpdated { post: Box<Post> },
    PostDeleted { post_id: Uuid },
    /// A comment was added (`+1`) or removed (`-1`) under a post.
    CommentsCountChanged { post_id: Uuid, delta: i32 },
}

impl MutationEvent {
    /// The post this event targets, if it targets exactly one.
    pub fn post_id(&self) -> Option<Uuid> {
        match self {
            MutationEvent::LikeToggled { post_id }
            | MutationEvent::LikeConfirmed { post_id, .. }
            | MutationEvent::BookmarkToggled { post_id }
            | MutationEvent::BookmarkConfirmed { post_id, .. }
            | MutationEvent::PostDeleted { post_id }
            | MutationEvent::CommentsCountChanged { post_id, .. } => Some(*post_id),
            MutationEvent::PostCreated { post } | MutationEvent::PostUpdated { post } => {
                Some(post.id)
            }
            MutationEvent::AuthorSubscribed { .. } | MutationEvent::FollowStateSynced { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MutationEvent::LikeToggled { .. } => "like_toggled",
            MutationEvent::LikeConfirmed { .. } => "like_confirmed",
            MutationEvent::BookmarkToggled { .. } => "bookmark_toggled",
            MutationEvent::BookmarkConfirmed { .. } => "bookmark_confirmed",
            MutationEvent::AuthorSubscribed { .. } => "author_subscribed",
            MutationEvent::FollowStateSynced { .. } => "follow_state_synced",
            MutationEvent::PostCreated { .. } => "post_created",
            MutationEvent::PostUpdated { .. } => "post_updated",
            MutationEvent::PostDeleted { .. } => "post_deleted",
            MutationEvent::CommentsCountChanged { .. } => "comments_count_changed",
        }
    }
}
