//! Client-state stores for the anime blog.
//!
//! Each store owns one slice of state and talks to the server only through
//! [`domains::BlogApi`]. Slices holding post copies stay consistent by
//! observing [`MutationEvent`](domains::MutationEvent)s on a shared [`EventBus`].

pub mod bus;
pub mod client;
pub mod comments;
pub mod detail;
pub mod optimistic;
pub mod posts;
pub mod profile;
pub mod search;
pub mod session;
pub mod subscriptions;
pub mod sync;

pub use bus::{EventBus, MutationObserver};
pub use client::{BlogClient, ClientOptions};
pub use comments::{
    CommentMutation, CommentNode, CommentSort, CommentStore, CommentTree, EditMode, Expansion,
    ReplyDraft, Viewer,
};
pub use detail::{DetailState, PostDetailStore};
pub use optimistic::Optimistic;
pub use posts::{PostsState, PostsStore};
pub use profile::{ProfileState, ProfileStore};
pub use search::{SearchState, SearchStore};
pub use session::{SessionState, SessionStatus, SessionStore};
pub use subscriptions::{SubscriptionState, SubscriptionStore};
