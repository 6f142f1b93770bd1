//! Plain-text output.

use domains::{Post, User};
use services::comments::{sorted, CommentNode, CommentTree, Expansion};

pub fn posts(posts: &[Post]) {
    if posts.is_empty() {
        println!("(nothing here)");
        return;
    }
    for post in posts {
        println!(
            "{}  {}  by @{}  [{}]  {}{} likes, {} comments, {} min",
            post.id,
            post.title,
            post.author.username,
            post.category,
            if post.is_liked { "♥ " } else { "" },
            post.likes_count,
            post.comments_count,
            post.read_time(),
        );
    }
}

pub fn post_detail(post: &Post, followers: u64) {
    println!("{}", post.title);
    println!(
        "by {} (@{}, {} followers){}",
        post.author.display_name,
        post.author.username,
        followers,
        if post.is_subscribed { ", following" } else { "" }
    );
    let when = post.published_at.unwrap_or(post.created_at);
    println!("{}  ·  {} min read  ·  {}", when.format("%Y-%m-%d"), post.read_time(), post.category);
    if !post.tags.is_empty() {
        println!("#{}", post.tags.join(" #"));
    }
    println!();
    println!("{}", post.content);
    println!();
    println!(
        "{} likes{}  ·  {} comments  ·  {} views{}",
        post.likes_count,
        if post.is_liked { " (you)" } else { "" },
        post.comments_count,
        post.views_count,
        if post.is_bookmarked { "  ·  bookmarked" } else { "" }
    );
}

pub fn user(user: &User) {
    println!("{} (@{}) [{:?}]", user.display_name, user.username, user.role);
    if let Some(bio) = &user.bio {
        println!("{bio}");
    }
    println!(
        "{} posts  ·  {} followers  ·  {} following",
        user.posts_count, user.followers_count, user.following_count
    );
}

pub fn comment_tree(tree: &CommentTree) {
    if let Some(err) = &tree.error {
        println!("error: {err}");
    }
    if tree.roots.is_empty() {
        println!("(no comments)");
        return;
    }
    for node in tree.sorted_roots() {
        comment(tree, node, 0);
    }
}

fn comment(tree: &CommentTree, node: &CommentNode, depth: usize) {
    let indent = "  ".repeat(depth.min(tree.max_depth));
    let c = &node.comment;
    println!(
        "{indent}{}@{} · {} · +{}/-{}{}",
        if c.is_pinned { "📌 " } else { "" },
        c.author.username,
        c.created_at.format("%Y-%m-%d %H:%M"),
        c.likes,
        c.dislikes,
        if c.is_edited { " (edited)" } else { "" }
    );
    println!("{indent}  {}", c.content);
    match (&node.replies, node.expansion) {
        (Some(replies), Expansion::Expanded) if tree.can_nest(depth) => {
            for reply in sorted(replies, tree.sort) {
                comment(tree, reply, depth + 1);
            }
        }
        _ if c.reply_count > 0 => println!("{indent}  [{} replies]", c.reply_count),
        _ => {}
    }
}
