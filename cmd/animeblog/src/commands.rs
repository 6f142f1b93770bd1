use anyhow::{bail, Context};
use domains::PostFilters;
use services::{BlogClient, CommentSort, CommentStore, SessionStatus, Viewer};
use tracing::warn;
use uuid::Uuid;

use crate::render;

fn require_viewer(client: &BlogClient) -> anyhow::Result<Viewer> {
    match client.session.viewer() {
        Some(viewer) => Ok(viewer),
        None if client.session.status() == SessionStatus::Expired => {
            bail!("session expired; run `animeblog login <token>`")
        }
        None => bail!("not signed in; run `animeblog login <token>`"),
    }
}

/// Role is only known after the profile fetch; ownership checks need it.
async fn require_full_viewer(client: &BlogClient) -> anyhow::Result<Viewer> {
    require_viewer(client)?;
    client.session.refresh_profile(client.api().as_ref()).await?;
    require_viewer(client)
}

pub async fn feed(
    client: &BlogClient,
    page: u32,
    category: Option<String>,
    search: Option<String>,
    pages: u32,
) -> anyhow::Result<()> {
    let filters = PostFilters { category, search };
    let size = client.options().page_size;
    client.posts.load_page(filters, page, size).await?;
    for _ in 1..pages {
        if !client.posts.load_next_page().await? {
            break;
        }
    }
    let state = client.posts.snapshot();
    render::posts(&state.items);
    println!(
        "page {} of {} posts{}",
        state.page,
        state.total,
        if state.has_more { ", more available" } else { "" }
    );
    Ok(())
}

pub async fn show(client: &BlogClient, id: Uuid) -> anyhow::Result<()> {
    client.detail.load_by_id(id).await?;
    let post = client.detail.post().context("post vanished while loading")?;
    let followers = client.subscriptions.follower_count(&post.author);
    render::post_detail(&post, followers);
    Ok(())
}

pub async fn search(client: &BlogClient, query: &str) -> anyhow::Result<()> {
    client.search.search(query).await?;
    let state = client.search.snapshot();
    render::posts(&state.results);
    println!("{} of {} matches for {:?}", state.results.len(), state.total, state.query);
    Ok(())
}

pub async fn like(client: &BlogClient, id: Uuid) -> anyhow::Result<()> {
    require_viewer(client)?;
    client.detail.load_by_id(id).await?;
    let liked = client.detail.post().is_some_and(|p| p.is_liked);
    let outcome = client.posts.like_optimistic(id, liked).await?;
    println!(
        "{} ({} likes)",
        if outcome.is_liked { "liked" } else { "unliked" },
        outcome.likes_count
    );
    Ok(())
}

pub async fn bookmark(client: &BlogClient, id: Uuid) -> anyhow::Result<()> {
    require_viewer(client)?;
    client.detail.load_by_id(id).await?;
    let bookmarked = client.detail.post().is_some_and(|p| p.is_bookmarked);
    let outcome = client.posts.bookmark_optimistic(id, bookmarked).await?;
    println!(
        "{}",
        if outcome.is_bookmarked { "bookmarked" } else { "bookmark removed" }
    );
    Ok(())
}

pub async fn bookmarks(client: &BlogClient) -> anyhow::Result<()> {
    require_viewer(client)?;
    client.posts.load_bookmarks().await?;
    render::posts(&client.posts.bookmarked());
    Ok(())
}

pub async fn follow(client: &BlogClient, author: Uuid) -> anyhow::Result<()> {
    require_viewer(client)?;
    client.subscriptions.check(author).await?;
    let following = client.subscriptions.toggle(author).await?;
    let count = match client.subscriptions.load_subscriber_count(author).await {
        Ok(count) => count,
        Err(err) => {
            warn!(error = %err, "subscriber count unavailable");
            0
        }
    };
    println!(
        "{} ({count} followers)",
        if following { "following" } else { "unfollowed" }
    );
    Ok(())
}

pub async fn comments(
    client: &BlogClient,
    post: Uuid,
    sort: CommentSort,
    expand: bool,
    say: Option<String>,
    reply_to: Option<Uuid>,
) -> anyhow::Result<()> {
    let store = client.comments(post);
    store.set_sort(sort);
    store.load().await?;

    if let Some(text) = say {
        require_viewer(client)?;
        match reply_to {
            Some(target) => {
                let draft = store
                    .compose_reply(target)
                    .context("no such comment under this post")?;
                let text = format!("{}{}", draft.initial_text, text);
                store.submit_reply(&draft, &text).await?;
            }
            None => {
                store.submit_comment(&text).await?;
            }
        }
    }

    if expand {
        expand_all(&store).await;
    }
    render::comment_tree(&store.snapshot());
    Ok(())
}

async fn expand_all(store: &CommentStore) {
    let ids: Vec<Uuid> = store.sorted().iter().map(|n| n.comment.id).collect();
    for id in ids {
        if let Err(err) = store.expand(id).await {
            warn!(comment_id = %id, error = %err, "could not load replies");
        }
    }
}

pub async fn delete_post(client: &BlogClient, id: Uuid) -> anyhow::Result<()> {
    require_viewer(client)?;
    client.posts.delete_post(id).await?;
    println!("post deleted");
    Ok(())
}

pub async fn delete_comment(client: &BlogClient, post: Uuid, id: Uuid) -> anyhow::Result<()> {
    let viewer = require_full_viewer(client).await?;
    let store = client.comments(post);
    store.load().await?;
    // the target may be a reply that only arrives on expand
    if store.snapshot().find(id).is_none() {
        expand_all(&store).await;
    }
    store.delete(id, viewer).await?;
    println!("comment deleted");
    Ok(())
}

pub async fn login(client: &BlogClient, token: &str) -> anyhow::Result<()> {
    let identity = client.session.sign_in(token)?;
    println!("signed in as {} until {}", identity.subject, identity.expires_at);
    if let Err(err) = client.session.refresh_profile(client.api().as_ref()).await {
        warn!(error = %err, "profile not available yet");
    }
    Ok(())
}

pub fn logout(client: &BlogClient) -> anyhow::Result<()> {
    client.session.sign_out()?;
    println!("signed out");
    Ok(())
}

pub async fn whoami(client: &BlogClient) -> anyhow::Result<()> {
    match client.session.status() {
        SessionStatus::Anonymous => println!("anonymous"),
        SessionStatus::Expired => println!("session expired"),
        SessionStatus::Authenticated => {
            let user = client
                .session
                .refresh_profile(client.api().as_ref())
                .await?;
            render::user(&user);
        }
    }
    Ok(())
}

pub async fn profile(client: &BlogClient, user: Uuid, pages: u32) -> anyhow::Result<()> {
    client.profile.load(user).await?;
    for _ in 1..pages {
        if !client.profile.load_more().await? {
            break;
        }
    }
    let state = client.profile.snapshot();
    if let Some(user) = &state.user {
        render::user(user);
    }
    render::posts(&state.posts);
    Ok(())
}
