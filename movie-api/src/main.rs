//! movie-api - Movie CRUD HTTP service
//!
//! Configuration resolves from `--config`, then `MOVIE_API_CONFIG`, then the
//! platform config directory, then compiled defaults. Individual CLI flags
//! override file values.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use movie_common::api::{EmailAllowListAuthorizer, GoogleAccessTokenConverter};
use movie_common::config::{resolve_config_source, Config, ConfigSource, CONFIG_ENV_VAR};
use movie_common::db::init_database;
use movie_common::moviestore::SqliteDatastore;
use movie_common::random::CryptoStringGenerator;
use movie_api::{build_router, AppState};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "movie-api")]
#[command(about = "Movie CRUD HTTP service", long_about = None)]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides server.listen_addr
    #[arg(short, long, env = "MOVIE_API_ADDR")]
    addr: Option<String>,

    /// SQLite database path, overrides database.path
    #[arg(short, long, env = "MOVIE_API_DATABASE")]
    database: Option<PathBuf>,

    /// Default log filter, overrides log_level (RUST_LOG still wins)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let source = resolve_config_source(args.config.as_deref(), CONFIG_ENV_VAR);
    let mut config = Config::load(&source).context("Failed to load configuration")?;

    if let Some(addr) = args.addr {
        config.server.listen_addr = addr;
    }
    if let Some(path) = args.database {
        config.database.path = path;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting movie-api v{}", env!("CARGO_PKG_VERSION"));
    match &source {
        ConfigSource::Explicit(path) => info!("Configuration: {}", path.display()),
        ConfigSource::Default(path) if path.exists() => {
            info!("Configuration: {}", path.display())
        }
        ConfigSource::Default(path) => warn!(
            "No config file at {}, using compiled defaults",
            path.display()
        ),
        ConfigSource::Compiled => warn!("No config directory available, using compiled defaults"),
    }

    let pool = init_database(&config.database)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready: {}", config.database.path.display());

    let token_converter = GoogleAccessTokenConverter::new(config.auth.userinfo_url.as_str())
        .context("Failed to create access token converter")?;
    let authorizer = EmailAllowListAuthorizer::new(config.auth.authorized_emails.iter().cloned());
    if config.auth.authorized_emails.is_empty() {
        warn!("auth.authorized_emails is empty: every authenticated user is authorized");
    }

    let shutdown = CancellationToken::new();
    let state = AppState::new(
        Arc::new(SqliteDatastore::new(pool.clone())),
        Arc::new(CryptoStringGenerator),
        Arc::new(token_converter),
        Arc::new(authorizer),
    )
    .with_shutdown(shutdown.clone())
    .with_request_body_limit(config.server.request_body_limit);

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen_addr))?;
    info!("movie-api listening on http://{}", config.server.listen_addr);
    info!("Health check: http://{}/health", config.server.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
///
/// Cancels `shutdown` so in-flight store calls abort.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }

    shutdown.cancel();
}
