//! # Taskboard API Server
//!
//! HTTP API for projects and tasks: bearer-token login, role-scoped task
//! visibility, and task updates guarded by optimistic locking.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/taskboard JWT_SECRET=... cargo run -p taskboard-api
//! ```
//!
//! `DATABASE_URL=memory` runs against an empty in-process store. Users are
//! provisioned out of band and there is no signup endpoint, so in this mode
//! every login is rejected; it is only useful for smoke-testing the server
//! (`/health`, CORS, 401 handling).

use std::sync::Arc;

use anyhow::Context;
use taskboard_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
};
use taskboard_shared::{
    db::{
        pool::{self, DatabaseConfig},
        schema,
    },
    store::{MemoryStore, PgStore, Store},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "taskboard_api=debug,taskboard_shared=info,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    init_tracing(config.log_format);

    tracing::info!(
        "Taskboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );
    tracing::debug!(?config, "Configuration loaded");

    let (store, pg_store) = open_store(&config).await?;

    let state = AppState::new(store, config.clone()).context("Invalid password hashing config")?;
    let app = build_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pg_store) = pg_store {
        pool::close_pool(pg_store.pool().clone()).await;
    }

    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Opens the configured store, bootstrapping tables for PostgreSQL
async fn open_store(
    config: &Config,
) -> anyhow::Result<(Arc<dyn Store>, Option<Arc<PgStore>>)> {
    if config.database.is_memory() {
        tracing::warn!("Using in-memory store: no users exist, so logins fail; data is lost on shutdown");
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        return Ok((store, None));
    }

    let db_config = DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..DatabaseConfig::default()
    };

    let pg_pool = pool::create_pool(db_config)
        .await
        .context("Failed to connect to database")?;
    schema::ensure_schema(&pg_pool)
        .await
        .context("Failed to bootstrap tables")?;

    tracing::info!("Database ready");

    let pg_store = Arc::new(PgStore::new(pg_pool));
    let store: Arc<dyn Store> = pg_store.clone();
    Ok((store, Some(pg_store)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
