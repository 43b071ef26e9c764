//! # SmartTask API Server
//!
//! Serves the task tracker's REST API under `/api`.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/smarttask cargo run -p smarttask-api
//! DATABASE_URL=memory:// cargo run -p smarttask-api   # no database
//! ```

use smarttask_api::{
    app::{build_router, text_generator, AppState},
    config::Config,
};
use smarttask_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    store::Stores,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "smarttask_api=debug,smarttask_shared=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "SmartTask API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let (stores, pool) = if config.database.is_in_memory() {
        tracing::warn!("Using in-memory store, data will not survive a restart");
        (Stores::in_memory(), None)
    } else {
        let pool = create_pool(DatabaseConfig {
            max_connections: config.database.max_connections,
            ..DatabaseConfig::new(config.database.url.clone())
        })
        .await?;
        run_migrations(&pool).await?;
        (Stores::postgres(pool.clone()), Some(pool))
    };

    let generator = text_generator(&config.ai)?;
    let address = config.bind_address();
    let app = build_router(AppState::new(stores, generator, config)?);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Keep serving rather than shutting down on a broken signal handler.
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
