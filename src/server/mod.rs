// Gateway module for server - follows the Train Station Pattern
// All external access must go through this gateway

mod error;
mod routes;

pub use error::{ApiError, ErrorBody};
pub use routes::build_router;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::app::{AppState, Config};
use crate::runtime::spawn_idle_sweeper;

/// Run the HTTP server until Ctrl-C
pub async fn serve(config: Config) -> Result<()> {
    let startup_start = std::time::Instant::now();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let idle_ttl = config.history.idle_ttl_secs.map(Duration::from_secs);
    let sweep_every = Duration::from_secs(config.history.sweep_interval_secs.max(1));

    let state = AppState::from_config(config)?;
    if !state.orchestrator.is_configured() {
        tracing::warn!(
            policy = ?state.config.fallback.policy,
            "Chat model not configured; /chat follows the fallback policy"
        );
    }

    let sweeper = idle_ttl.map(|ttl| {
        tracing::info!(ttl_secs = ttl.as_secs(), "Idle session expiry enabled");
        spawn_idle_sweeper(Arc::clone(state.store()), ttl, sweep_every)
    });

    // Open CORS for browser clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = build_router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    let startup_duration = startup_start.elapsed();
    tracing::info!(
        duration_ms = startup_duration.as_millis() as u64,
        "Service initialized in {:?}",
        startup_duration
    );
    tracing::info!("Starting HTTP server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Clean up on shutdown
    if let Some(handle) = sweeper {
        handle.abort();
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
