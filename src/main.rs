//! # Bookstore server
//!
//! Loads settings, opens and migrates the database, seeds the first admin
//! when configured, then serves the API until the process is stopped.

use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bookstore::{
    api::create_router,
    config::{Config, Environment},
    database::Database,
    services::AppState,
};

const LIMITER_PRUNE_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.environment);

    info!(environment = ?config.environment, "Starting bookstore service");
    config.validate().context("invalid configuration")?;

    let database = Database::connect(&config.database_url)
        .await
        .context("failed to open database")?;
    database.migrate().await.context("failed to run migrations")?;
    info!("Database ready");

    let addr = config.server_addr();
    let state = AppState::new(database, config).context("failed to build application state")?;

    if let Some((email, password)) = state.config().admin_seed() {
        state
            .auth_service
            .ensure_admin(email, password)
            .await
            .context("failed to seed admin account")?;
    }

    let _limiter_pruning = state
        .login_limiter
        .clone()
        .spawn_pruning(LIMITER_PRUNE_PERIOD);

    let app = create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    info!("Server stopped");
    Ok(())
}

/// Pretty output while developing, JSON lines everywhere else.
fn init_tracing(environment: &Environment) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bookstore=debug,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if environment.is_development() {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .pretty(),
            )
            .init();
    } else {
        registry.with(fmt::layer().json().with_current_span(true)).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
