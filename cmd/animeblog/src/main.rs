//! # animeblog
//!
//! Terminal client for the anime blog. Assembles the HTTP and token adapters
//! from configuration and drives the client stores.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use api_adapters::HttpBlogApi;
use auth_adapters::{FileTokenStorage, JwtTokenDecoder, MemoryTokenStorage};
use clap::{Parser, Subcommand, ValueEnum};
use configs::{LogSettings, Settings};
use domains::TokenStorage;
use secrecy::ExposeSecret;
use services::{BlogClient, ClientOptions, CommentSort};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "animeblog")]
#[command(about = "Read and react to the anime blog from a terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Override `api.base_url`
    #[arg(long, global = true, env = "ANIMEBLOG_API")]
    api: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// List one page of the feed
    Feed {
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        search: Option<String>,

        /// Fetch this many pages in a row
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// Show one post
    Show { id: Uuid },

    /// Search posts
    Search { query: String },

    /// Like or unlike a post
    Like { id: Uuid },

    /// Bookmark or unbookmark a post; without an id, list bookmarks
    Bookmark { id: Option<Uuid> },

    /// Follow or unfollow an author
    Follow { author: Uuid },

    /// Show the comment tree of a post
    Comments {
        post: Uuid,

        #[arg(long, value_enum, default_value_t = SortArg::Newest)]
        sort: SortArg,

        /// Fetch replies of every top-level comment
        #[arg(long)]
        expand: bool,

        /// Post a top-level comment first
        #[arg(long)]
        say: Option<String>,

        /// Reply to this comment with the text of `--say`
        #[arg(long, requires = "say")]
        reply_to: Option<Uuid>,
    },

    /// Delete a post, or a comment when `--post` is given
    Delete {
        id: Uuid,

        /// Post the comment `id` belongs to
        #[arg(long)]
        post: Option<Uuid>,
    },

    /// Store a session token
    Login { token: String },

    Logout,

    /// Show the current session
    Whoami,

    /// Show a user's profile and posts
    Profile {
        user: Uuid,

        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Newest,
    Oldest,
    Popular,
}

impl From<SortArg> for CommentSort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Newest => CommentSort::Newest,
            SortArg::Oldest => CommentSort::Oldest,
            SortArg::Popular => CommentSort::Popular,
        }
    }
}

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_client(settings: &Settings) -> anyhow::Result<BlogClient> {
    let storage: Arc<dyn TokenStorage> = match &settings.session.token {
        Some(token) => Arc::new(MemoryTokenStorage::with_token(token.expose_secret())),
        None => Arc::new(FileTokenStorage::new(&settings.session.token_path)),
    };
    let api = HttpBlogApi::new(
        settings.api.base_url.clone(),
        Duration::from_secs(settings.api.request_timeout_secs),
        storage.clone(),
    )
    .context("building HTTP client")?;

    let options = ClientOptions {
        page_size: settings.feed.page_size,
        search_limit: settings.feed.search_limit,
        max_comment_depth: settings.comments.max_depth,
    };
    Ok(BlogClient::new(
        Arc::new(api),
        storage,
        Arc::new(JwtTokenDecoder::new()),
        options,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load().context("loading configuration")?;
    if let Some(api) = cli.api {
        settings.api.base_url = api;
    }
    init_tracing(&settings.log);

    let client = build_client(&settings)?;
    let status = client.session.load();
    info!(?status, base_url = %settings.api.base_url, "client ready");

    match cli.command {
        Command::Feed {
            page,
            category,
            search,
            pages,
        } => commands::feed(&client, page, category, search, pages).await,
        Command::Show { id } => commands::show(&client, id).await,
        Command::Search { query } => commands::search(&client, &query).await,
        Command::Like { id } => commands::like(&client, id).await,
        Command::Bookmark { id: Some(id) } => commands::bookmark(&client, id).await,
        Command::Bookmark { id: None } => commands::bookmarks(&client).await,
        Command::Follow { author } => commands::follow(&client, author).await,
        Command::Comments {
            post,
            sort,
            expand,
            say,
            reply_to,
        } => commands::comments(&client, post, sort.into(), expand, say, reply_to).await,
        Command::Delete { id, post: None } => commands::delete_post(&client, id).await,
        Command::Delete { id, post: Some(post) } => {
            commands::delete_comment(&client, post, id).await
        }
        Command::Login { token } => commands::login(&client, &token).await,
        Command::Logout => commands::logout(&client),
        Command::Whoami => commands::whoami(&client).await,
        Command::Profile { user, pages } => commands::profile(&client, user, pages).await,
    }
}
