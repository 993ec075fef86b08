//! # TaskNest API Server
//!
//! Serves the task REST API, the `create-task-with-ai` function, and public
//! attachment downloads.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/tasknest JWT_SECRET=$(openssl rand -hex 32) \
//!     cargo run -p tasknest-api
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON log lines and `RUST_LOG` to override the
//! default filter.

use std::sync::Arc;

use anyhow::Context;
use tasknest_api::{
    app::{build_router, AppState},
    config::Config,
};
use tasknest_shared::{
    ai::{LabelSuggester, OpenAiSuggester},
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    storage::LocalObjectStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tasknest_api=debug,tasknest_shared=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    init_tracing();

    tracing::info!("TaskNest API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let pool = create_pool(DatabaseConfig {
        max_connections: config.database.max_connections,
        ..DatabaseConfig::from_url(&config.database.url)
    })
    .await
    .context("Failed to connect to database")?;

    run_migrations(&pool).await.context("Failed to run migrations")?;

    tokio::fs::create_dir_all(&config.storage.root)
        .await
        .with_context(|| format!("Failed to create storage root {}", config.storage.root.display()))?;
    let store = Arc::new(LocalObjectStore::new(&config.storage.root));

    let suggester: Option<Arc<dyn LabelSuggester>> = match &config.openai {
        Some(settings) => {
            tracing::info!(model = %settings.model, "AI label suggestions enabled");
            Some(Arc::new(OpenAiSuggester::new(settings.client_config())?))
        }
        None => {
            tracing::info!("OPENAI_API_KEY not set, AI label suggestions disabled");
            None
        }
    };

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config, store, suggester));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, closing database pool");
    close_pool(pool).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
