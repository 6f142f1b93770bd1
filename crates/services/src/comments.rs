//! # Comment Tree
//!
//! Nested comments under one post, with lazily fetched replies.
//!
//! Threads are deliberately flattened on reply: answering a nested reply
//! attaches the new comment to the top-level ancestor and seeds the composer
//! with an `@mention` of the replied-to author. `max_depth` only limits how
//! deep the UI indents.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    AppError, BlogApi, Comment, CommentDraft, CommentReaction, CommentReactionOutcome,
    MutationEvent, Result, Role,
};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::bus::EventBus;
use crate::optimistic::Optimistic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentSort {
    #[default]
    Newest,
    Oldest,
    /// `likes - dislikes`, highest first
    Popular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expansion {
    #[default]
    Collapsed,
    Expanded,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Viewing,
    Editing { draft: String },
}

/// Who is acting, for owner/moderator gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub id: Uuid,
    pub role: Role,
}

impl Viewer {
    pub fn owns(&self, comment: &Comment) -> bool {
        comment.author.id == self.id
    }

    pub fn may_delete(&self, comment: &Comment) -> bool {
        self.owns(comment) || self.role.can_moderate()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    /// The comment itself; its `replies` field is always `None`, the
    /// children live in `replies` below.
    pub comment: Comment,
    /// `None` until the replies were embedded or fetched.
    pub replies: Option<Vec<CommentNode>>,
    pub expansion: Expansion,
    pub loading_replies: bool,
    pub mode: EditMode,
}

impl CommentNode {
    pub fn new(mut comment: Comment) -> Self {
        let replies = comment
            .replies
            .take()
            .map(|replies| replies.into_iter().map(CommentNode::new).collect());
        Self {
            comment,
            replies,
            expansion: Expansion::Collapsed,
            loading_replies: false,
            mode: EditMode::Viewing,
        }
    }

    pub fn needs_fetch(&self) -> bool {
        self.replies.is_none() && self.comment.reply_count > 0
    }

    /// Comments this node stands for, counting unfetched replies by hint.
    pub fn subtree_size(&self) -> u32 {
        1 + match &self.replies {
            Some(replies) => replies.iter().map(CommentNode::subtree_size).sum(),
            None => self.comment.reply_count,
        }
    }
}

/// Composer state produced by [`CommentTree::compose_reply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyDraft {
    /// The comment the reply will be attached to on submit.
    pub parent_id: Uuid,
    pub initial_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandAction {
    /// Replies are already at hand (or there are none).
    Expanded,
    /// Caller must fetch replies, then call `finish_expand`.
    Fetch,
    /// A fetch for this node is already in flight.
    AlreadyLoading,
    NotFound,
}

/// Local engagement step on one comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentMutation {
    Toggle(Uuid, CommentReaction),
    Set(Uuid, CommentReactionOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentTree {
    pub post_id: Uuid,
    pub roots: Vec<CommentNode>,
    pub max_depth: usize,
    pub sort: CommentSort,
    pub loading: bool,
    pub error: Option<String>,
}

impl CommentTree {
    pub fn new(post_id: Uuid, max_depth: usize) -> Self {
        Self {
            post_id,
            roots: Vec::new(),
            max_depth,
            sort: CommentSort::default(),
            loading: false,
            error: None,
        }
    }

    pub fn set_comments(&mut self, comments: Vec<Comment>) {
        self.roots = comments.into_iter().map(CommentNode::new).collect();
    }

    pub fn find(&self, id: Uuid) -> Option<&CommentNode> {
        find_in(&self.roots, id)
    }

    pub fn find_mut(&mut self, id: Uuid) -> Option<&mut CommentNode> {
        find_in_mut(&mut self.roots, id)
    }

    /// Depth of `id` (0 for top level) and the id of its top-level ancestor.
    pub fn locate(&self, id: Uuid) -> Option<(usize, Uuid)> {
        locate_in(&self.roots, id, 0, None)
    }

    /// Whether a node at `depth` may still show nested replies.
    pub fn can_nest(&self, depth: usize) -> bool {
        depth < self.max_depth
    }

    /// Top-level comments in display order: pinned first, then by `sort`.
    pub fn sorted_roots(&self) -> Vec<&CommentNode> {
        sorted(&self.roots, self.sort)
    }

    pub fn compose_reply(&self, target: Uuid) -> Option<ReplyDraft> {
        let (depth, root) = self.locate(target)?;
        if depth == 0 {
            return Some(ReplyDraft {
                parent_id: target,
                initial_text: String::new(),
            });
        }
        let handle = &self.find(target)?.comment.author.username;
        Some(ReplyDraft {
            parent_id: root,
            initial_text: format!("@{handle} "),
        })
    }

    /// Inserts a freshly created comment under `parent` (or as a new root).
    pub fn attach(&mut self, parent: Option<Uuid>, comment: Comment) {
        let Some(parent) = parent else {
            self.roots.insert(0, CommentNode::new(comment));
            return;
        };
        let Some(node) = self.find_mut(parent) else {
            debug!(%parent, "parent vanished before reply landed");
            return;
        };
        node.comment.reply_count += 1;
        match node.replies.as_mut() {
            Some(replies) => replies.push(CommentNode::new(comment)),
            // unfetched siblings exist; stay collapsed so the next expand
            // fetches all of them, this reply included
            None if node.comment.reply_count > 1 => return,
            None => node.replies = Some(vec![CommentNode::new(comment)]),
        }
        node.expansion = Expansion::Expanded;
    }

    /// Removes `id` and its subtree, fixing the parent's reply count.
    pub fn remove(&mut self, id: Uuid) -> Option<CommentNode> {
        remove_in(&mut self.roots, id)
    }

    pub fn begin_expand(&mut self, id: Uuid) -> ExpandAction {
        let Some(node) = self.find_mut(id) else {
            return ExpandAction::NotFound;
        };
        if node.loading_replies {
            return ExpandAction::AlreadyLoading;
        }
        if node.needs_fetch() {
            node.loading_replies = true;
            return ExpandAction::Fetch;
        }
        node.expansion = Expansion::Expanded;
        ExpandAction::Expanded
    }

    pub fn finish_expand(&mut self, id: Uuid, replies: Vec<Comment>) {
        if let Some(node) = self.find_mut(id) {
            node.comment.reply_count = replies.len() as u32;
            node.replies = Some(replies.into_iter().map(CommentNode::new).collect());
            node.loading_replies = false;
            node.expansion = Expansion::Expanded;
        }
    }

    pub fn fail_expand(&mut self, id: Uuid) {
        if let Some(node) = self.find_mut(id) {
            node.loading_replies = false;
        }
    }

    pub fn collapse(&mut self, id: Uuid) {
        if let Some(node) = self.find_mut(id) {
            node.expansion = Expansion::Collapsed;
        }
    }

    pub fn apply(&mut self, mutation: CommentMutation) {
        match mutation {
            CommentMutation::Toggle(id, reaction) => {
                if let Some(node) = self.find_mut(id) {
                    match reaction {
                        CommentReaction::Like => node.comment.toggle_like(),
                        CommentReaction::Dislike => node.comment.toggle_dislike(),
                    }
                }
            }
            CommentMutation::Set(id, outcome) => {
                if let Some(node) = self.find_mut(id) {
                    node.comment.apply_reaction(&outcome);
                }
            }
        }
    }
}

/// Pinned first regardless of `sort`; the sort is stable within groups.
pub fn sorted(nodes: &[CommentNode], sort: CommentSort) -> Vec<&CommentNode> {
    let mut ordered: Vec<&CommentNode> = nodes.iter().collect();
    ordered.sort_by(|a, b| {
        let (a, b) = (&a.comment, &b.comment);
        b.is_pinned.cmp(&a.is_pinned).then_with(|| match sort {
            CommentSort::Newest => b.created_at.cmp(&a.created_at),
            CommentSort::Oldest => a.created_at.cmp(&b.created_at),
            CommentSort::Popular => b
                .score()
                .cmp(&a.score())
                .then_with(|| b.created_at.cmp(&a.created_at)),
        })
    });
    ordered
}

fn find_in(nodes: &[CommentNode], id: Uuid) -> Option<&CommentNode> {
    nodes.iter().find_map(|node| {
        if node.comment.id == id {
            Some(node)
        } else {
            node.replies.as_deref().and_then(|replies| find_in(replies, id))
        }
    })
}

fn find_in_mut(nodes: &mut [CommentNode], id: Uuid) -> Option<&mut CommentNode> {
    for node in nodes.iter_mut() {
        if node.comment.id == id {
            return Some(node);
        }
        if let Some(found) = node
            .replies
            .as_deref_mut()
            .and_then(|replies| find_in_mut(replies, id))
        {
            return Some(found);
        }
    }
    None
}

fn locate_in(
    nodes: &[CommentNode],
    id: Uuid,
    depth: usize,
    root: Option<Uuid>,
) -> Option<(usize, Uuid)> {
    nodes.iter().find_map(|node| {
        let root = root.unwrap_or(node.comment.id);
        if node.comment.id == id {
            return Some((depth, root));
        }
        node.replies
            .as_deref()
            .and_then(|replies| locate_in(replies, id, depth + 1, Some(root)))
    })
}

fn remove_in(nodes: &mut Vec<CommentNode>, id: Uuid) -> Option<CommentNode> {
    if let Some(pos) = nodes.iter().position(|n| n.comment.id == id) {
        return Some(nodes.remove(pos));
    }
    for node in nodes.iter_mut() {
        if let Some(replies) = node.replies.as_mut() {
            if let Some(removed) = remove_in(replies, id) {
                node.comment.reply_count = node.comment.reply_count.saturating_sub(1);
                return Some(removed);
            }
        }
    }
    None
}

/// Network-facing wrapper around one post's [`CommentTree`].
pub struct CommentStore {
    api: Arc<dyn BlogApi>,
    bus: Arc<EventBus>,
    state: Mutex<CommentTree>,
}

impl CommentStore {
    pub fn new(api: Arc<dyn BlogApi>, bus: Arc<EventBus>, post_id: Uuid, max_depth: usize) -> Self {
        Self {
            api,
            bus,
            state: Mutex::new(CommentTree::new(post_id, max_depth)),
        }
    }

    pub fn snapshot(&self) -> CommentTree {
        self.state.lock().clone()
    }

    pub fn post_id(&self) -> Uuid {
        self.state.lock().post_id
    }

    pub fn set_sort(&self, sort: CommentSort) {
        self.state.lock().sort = sort;
    }

    /// Top-level comments in display order.
    pub fn sorted(&self) -> Vec<CommentNode> {
        self.state
            .lock()
            .sorted_roots()
            .into_iter()
            .cloned()
            .collect()
    }

    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<()> {
        let post_id = {
            let mut state = self.state.lock();
            state.loading = true;
            state.error = None;
            state.post_id
        };
        let result = self.api.list_comments(post_id).await;

        let mut state = self.state.lock();
        state.loading = false;
        match result {
            Ok(comments) => {
                info!(count = comments.len(), "comments loaded");
                state.set_comments(comments);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "comment load failed");
                let err = AppError::from(err);
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Expands a node, fetching its replies first when only a count is known.
    #[instrument(skip(self))]
    pub async fn expand(&self, comment_id: Uuid) -> Result<()> {
        let action = self.state.lock().begin_expand(comment_id);
        match action {
            ExpandAction::Expanded => return Ok(()),
            ExpandAction::AlreadyLoading => {
                debug!("replies already loading");
                return Ok(());
            }
            ExpandAction::NotFound => {
                return Err(AppError::NotFound("comment", comment_id.to_string()))
            }
            ExpandAction::Fetch => {}
        }

        match self.api.list_replies(comment_id).await {
            Ok(replies) => {
                self.state.lock().finish_expand(comment_id, replies);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "reply fetch failed");
                self.state.lock().fail_expand(comment_id);
                Err(err.into())
            }
        }
    }

    pub fn collapse(&self, comment_id: Uuid) {
        self.state.lock().collapse(comment_id);
    }

    pub fn begin_edit(&self, comment_id: Uuid, viewer: Viewer) -> Result<()> {
        let mut state = self.state.lock();
        let node = state
            .find_mut(comment_id)
            .ok_or_else(|| AppError::NotFound("comment", comment_id.to_string()))?;
        if !viewer.owns(&node.comment) {
            return Err(AppError::Forbidden("only the author can edit a comment".into()));
        }
        node.mode = EditMode::Editing {
            draft: node.comment.content.clone(),
        };
        Ok(())
    }

    pub fn cancel_edit(&self, comment_id: Uuid) {
        if let Some(node) = self.state.lock().find_mut(comment_id) {
            node.mode = EditMode::Viewing;
        }
    }

    /// Sends the edit and returns the node to `Viewing`. On failure the node
    /// stays in `Editing` so the draft is not lost.
    #[instrument(skip(self, content))]
    pub async fn save_edit(&self, comment_id: Uuid, content: &str, viewer: Viewer) -> Result<()> {
        {
            let state = self.state.lock();
            let node = state
                .find(comment_id)
                .ok_or_else(|| AppError::NotFound("comment", comment_id.to_string()))?;
            if !viewer.owns(&node.comment) {
                return Err(AppError::Forbidden("only the author can edit a comment".into()));
            }
        }
        CommentDraft {
            content: content.to_string(),
            parent_id: None,
        }
        .validate()?;

        let updated = self.api.update_comment(comment_id, content.trim()).await?;

        if let Some(node) = self.state.lock().find_mut(comment_id) {
            node.comment.content = updated.content;
            node.comment.is_edited = true;
            node.comment.edited_at = updated.edited_at.or_else(|| Some(Utc::now()));
            node.mode = EditMode::Viewing;
        }
        Ok(())
    }

    /// Owner or moderator only. Removes the node and its subtree.
    #[instrument(skip(self))]
    pub async fn delete(&self, comment_id: Uuid, viewer: Viewer) -> Result<()> {
        {
            let state = self.state.lock();
            let node = state
                .find(comment_id)
                .ok_or_else(|| AppError::NotFound("comment", comment_id.to_string()))?;
            if !viewer.may_delete(&node.comment) {
                return Err(AppError::Forbidden(
                    "only the author or a moderator can delete a comment".into(),
                ));
            }
        }

        self.api.delete_comment(comment_id).await?;

        let (post_id, removed) = {
            let mut state = self.state.lock();
            (state.post_id, state.remove(comment_id))
        };
        if let Some(removed) = removed {
            let delta = -(removed.subtree_size() as i32);
            self.bus
                .publish(MutationEvent::CommentsCountChanged { post_id, delta });
        }
        Ok(())
    }

    pub fn compose_reply(&self, target: Uuid) -> Option<ReplyDraft> {
        self.state.lock().compose_reply(target)
    }

    /// Creates a top-level comment.
    pub async fn submit_comment(&self, content: &str) -> Result<Comment> {
        self.submit(None, content).await
    }

    /// Creates a reply under `draft.parent_id`, as decided by `compose_reply`.
    pub async fn submit_reply(&self, draft: &ReplyDraft, content: &str) -> Result<Comment> {
        self.submit(Some(draft.parent_id), content).await
    }

    #[instrument(skip(self, content))]
    async fn submit(&self, parent_id: Option<Uuid>, content: &str) -> Result<Comment> {
        let draft = CommentDraft {
            content: content.trim().to_string(),
            parent_id,
        };
        draft.validate()?;

        let post_id = self.post_id();
        let created = self.api.create_comment(post_id, &draft).await?;
        self.state.lock().attach(parent_id, created.clone());
        self.bus
            .publish(MutationEvent::CommentsCountChanged { post_id, delta: 1 });
        Ok(created)
    }

    pub async fn like(&self, comment_id: Uuid) -> Result<CommentReactionOutcome> {
        self.react(comment_id, CommentReaction::Like).await
    }

    pub async fn dislike(&self, comment_id: Uuid) -> Result<CommentReactionOutcome> {
        self.react(comment_id, CommentReaction::Dislike).await
    }

    /// Optimistic toggle; the inverse restores the exact prior counters.
    async fn react(
        &self,
        comment_id: Uuid,
        reaction: CommentReaction,
    ) -> Result<CommentReactionOutcome> {
        let prior = {
            let state = self.state.lock();
            let comment = &state
                .find(comment_id)
                .ok_or_else(|| AppError::NotFound("comment", comment_id.to_string()))?
                .comment;
            CommentReactionOutcome {
                likes: comment.likes,
                dislikes: comment.dislikes,
                is_liked: comment.is_liked,
                is_disliked: comment.is_disliked,
            }
        };
        Optimistic::new(
            CommentMutation::Toggle(comment_id, reaction),
            CommentMutation::Set(comment_id, prior),
        )
        .run(
            |m| self.state.lock().apply(m),
            self.send_reaction(comment_id, reaction),
        )
        .await
    }

    async fn send_reaction(
        &self,
        comment_id: Uuid,
        reaction: CommentReaction,
    ) -> Result<CommentReactionOutcome> {
        let outcome = self.api.react_to_comment(comment_id, reaction).await?;
        self.state
            .lock()
            .apply(CommentMutation::Set(comment_id, outcome));
        Ok(outcome)
    }
}
