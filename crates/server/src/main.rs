//! Yatube-rs server entry point.
//!
//! Without a subcommand the HTTP server is started. Accounts and groups have
//! no pages of their own and are created from the command line.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use clap::{Parser, Subcommand};
use tokio::signal;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yatube_api::{AppState, PageCache, app};
use yatube_common::{Config, LocalStorage, StorageBackend};
use yatube_core::{
    CommentService, CreateGroupInput, CreateUserInput, FollowService, GroupService, PostService,
    UserService,
};
use yatube_db::repositories::{
    CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};

/// Largest accepted request body (image uploads included).
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Time a request may take before it is answered with 408.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "yatube")]
#[command(about = "Yatube blog server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server (default)
    Serve,

    /// Create a user and print its access token
    CreateUser {
        /// Login name
        username: String,
    },

    /// Create a group posts can be filed under
    CreateGroup {
        /// URL slug
        slug: String,

        /// Display title
        title: String,

        /// Optional description
        description: Option<String>,
    },
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Repositories over one connection pool.
struct Repositories {
    users: UserRepository,
    groups: GroupRepository,
    posts: PostRepository,
    comments: CommentRepository,
    follows: FollowRepository,
}

impl Repositories {
    fn new(db: &Arc<sea_orm::DatabaseConnection>) -> Self {
        Self {
            users: UserRepository::new(Arc::clone(db)),
            groups: GroupRepository::new(Arc::clone(db)),
            posts: PostRepository::new(Arc::clone(db)),
            comments: CommentRepository::new(Arc::clone(db)),
            follows: FollowRepository::new(Arc::clone(db)),
        }
    }
}

fn build_state(config: &Config, repos: Repositories) -> AppState {
    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::from_config(&config.storage));

    AppState {
        user_service: UserService::new(repos.users.clone()),
        group_service: GroupService::new(repos.groups.clone()),
        post_service: PostService::new(
            repos.posts,
            repos.users.clone(),
            repos.groups,
            storage,
            config.pagination.posts_per_page,
        ),
        comment_service: CommentService::new(repos.comments, repos.users),
        follow_service: FollowService::new(repos.follows),
        page_cache: PageCache::new(Duration::from_secs(config.cache.index_ttl_secs)),
        login_url: config.auth.login_url.clone(),
    }
}

async fn create_user(repos: Repositories, username: String) -> anyhow::Result<()> {
    let user = UserService::new(repos.users)
        .create(CreateUserInput { username })
        .await?;

    info!(
        user_id = %user.id,
        username = %user.username,
        token = user.token.as_deref().unwrap_or_default(),
        "User created; send the token as a Bearer header or the sessionid cookie"
    );
    Ok(())
}

async fn create_group(
    repos: Repositories,
    slug: String,
    title: String,
    description: Option<String>,
) -> anyhow::Result<()> {
    let group = GroupService::new(repos.groups)
        .create(CreateGroupInput {
            title,
            slug,
            description: description.unwrap_or_default(),
        })
        .await?;

    info!(group_id = %group.id, slug = %group.slug, "Group created");
    Ok(())
}

async fn serve(config: Config, repos: Repositories) -> anyhow::Result<()> {
    let state = build_state(&config, repos);

    let app = app(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http());

    let ip = config
        .server
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("invalid server.host: {}", config.server.host))?;
    let addr = SocketAddr::new(ip, config.server.port);
    info!(url = %config.server.url, "Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yatube=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::load().context("failed to load configuration")?;

    let db = yatube_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    yatube_db::migrate(&db).await?;
    info!("Migrations completed");

    let repos = Repositories::new(&Arc::new(db));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, repos).await,
        Command::CreateUser { username } => create_user(repos, username).await,
        Command::CreateGroup {
            slug,
            title,
            description,
        } => create_group(repos, slug, title, description).await,
    }
}
