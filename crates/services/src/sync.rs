//! Shared reducer: how one post copy, or a list of copies, reacts to a
//! [`MutationEvent`]. Every slice that holds posts goes through here, so the
//! collection, detail, search and profile copies cannot drift apart.

use std::collections::HashSet;

use domains::{MutationEvent, Post};
use uuid::Uuid;

/// Applies `event` to a single post. Returns whether the post changed.
///
/// List-level events (`PostCreated`, `PostDeleted`) are not handled here.
pub fn apply_to_post(post: &mut Post, event: &MutationEvent) -> bool {
    match event {
        MutationEvent::LikeToggled { post_id } if post.id == *post_id => {
            post.toggle_like();
            true
        }
        MutationEvent::LikeConfirmed {
            post_id,
            is_liked,
            likes_count,
        } if post.id == *post_id => {
            post.is_liked = *is_liked;
            post.likes_count = *likes_count;
            true
        }
        MutationEvent::BookmarkToggled { post_id } if post.id == *post_id => {
            post.toggle_bookmark();
            true
        }
        MutationEvent::BookmarkConfirmed {
            post_id,
            is_bookmarked,
        } if post.id == *post_id => {
            post.is_bookmarked = *is_bookmarked;
            true
        }
        MutationEvent::AuthorSubscribed {
            author_id,
            subscribed,
        }
        | MutationEvent::FollowStateSynced {
            author_id,
            subscribed,
        } if post.is_by(*author_id) => {
            post.is_subscribed = *subscribed;
            true
        }
        MutationEvent::PostUpdated { post: updated } if post.id == updated.id => {
            // viewer flags are local knowledge; the edit response may not carry them
            let (liked, bookmarked, subscribed) =
                (post.is_liked, post.is_bookmarked, post.is_subscribed);
            *post = (**updated).clone();
            post.is_liked = liked;
            post.is_bookmarked = bookmarked;
            post.is_subscribed = subscribed;
            true
        }
        MutationEvent::CommentsCountChanged { post_id, delta } if post.id == *post_id => {
            post.comments_count = post.comments_count.saturating_add_signed(*delta);
            true
        }
        _ => false,
    }
}

/// Applies `event` to every matching post in `posts`, removing deleted ones.
/// Returns how many entries changed or were removed.
pub fn apply_to_list(posts: &mut Vec<Post>, event: &MutationEvent) -> usize {
    match event {
        MutationEvent::PostDeleted { post_id } => {
            let before = posts.len();
            posts.retain(|p| p.id != *post_id);
            before - posts.len()
        }
        MutationEvent::PostCreated { .. } => 0,
        _ => posts
            .iter_mut()
            .map(|post| usize::from(apply_to_post(post, event)))
            .sum(),
    }
}

/// Appends the posts of a later page whose ids are not yet held.
pub fn append_unseen(posts: &mut Vec<Post>, page: Vec<Post>) {
    let mut seen: HashSet<Uuid> = posts.iter().map(|p| p.id).collect();
    posts.extend(page.into_iter().filter(|p| seen.insert(p.id)));
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{Duration, TimeZone, Utc};
    use domains::{AuthorSnapshot, Comment, Post, PostStatus, Role, Visibility};
    use uuid::Uuid;

    pub fn author(username: &str) -> AuthorSnapshot {
        AuthorSnapshot {
            id: Uuid::new_v4(),
            display_name: username.to_uppercase(),
            username: username.to_string(),
            avatar_url: None,
            role: Role::User,
            followers_count: 0,
        }
    }

    pub fn post_by(author: &AuthorSnapshot, likes: u32) -> Post {
        Post {
            id: Uuid::new_v4(),
            title: "Mushishi rewatch notes".into(),
            content: "Ginko wanders through quiet valleys.".into(),
            category: "review".into(),
            tags: vec!["seinen".into()],
            likes_count: likes,
            comments_count: 0,
            views_count: 0,
            is_liked: false,
            is_bookmarked: false,
            is_subscribed: false,
            author: author.clone(),
            published_at: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            read_time_minutes: None,
            status: PostStatus::Published,
            visibility: Visibility::Public,
        }
    }

    pub fn post(likes: u32) -> Post {
        post_by(&author("ginko"), likes)
    }

    pub fn comment(post_id: Uuid, author: &AuthorSnapshot, minutes: i64) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            post_id,
            content: "great arc".into(),
            author: author.clone(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minutes),
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
}
