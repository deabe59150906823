//! spendshred-server — subscription spend tracker
//!
//! Long-running HTTP service that:
//! - Tracks SaaS subscriptions and their seat usage (JWT authenticated CRUD)
//! - Reports spend, waste and a portfolio health score
//! - Connects a user's Gmail account and scans it for receipts and
//!   dormant-account notices

mod api;
mod auth;
mod config;
mod db;
mod error;
mod google;
mod scanner;
mod services;
mod state;
mod util;

use std::net::SocketAddr;

use config::Config;
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spendshred_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting spendshred-server (env: {})", config.environment);
    if config.google_client_id.is_empty() {
        tracing::warn!("GOOGLE_CLIENT_ID not set, Gmail sign-in will fail");
    }

    let state = AppState::new(&config).await?;
    let app = api::create_router(state.clone(), &config);

    // Periodic rate limiter cleanup (every 5 minutes)
    let rate_limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter.cleanup().await;
        }
    });

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("spendshred-server HTTP listening on {http_addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    state.pool.close().await;
    tracing::info!("spendshred-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
