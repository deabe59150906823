//! Application state

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::rate_limit::RateLimiter;
use crate::config::Config;
use crate::db;
use crate::google::GoogleConfig;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection pool
    pub pool: SqlitePool,
    /// JWT secret for user authentication
    pub jwt_secret: String,
    /// Google OAuth registration and endpoints
    pub google: Arc<GoogleConfig>,
    /// Outbound HTTP client (Google APIs)
    pub http: reqwest::Client,
    /// Rate limiter for login/registration routes
    pub rate_limiter: RateLimiter,
    /// Frontend base URL for OAuth redirects
    pub frontend_url: String,
}

impl AppState {
    /// Open the database, run migrations, optionally seed demo data
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = db::connect(&config.database_url).await?;

        if config.seed_demo_data {
            let seeded = db::subscriptions::seed_if_empty(&pool).await?;
            if seeded > 0 {
                tracing::info!(seeded, "Seeded demo subscriptions");
            }
        }

        Ok(Self::with_pool(config, pool))
    }

    pub fn with_pool(config: &Config, pool: SqlitePool) -> Self {
        Self {
            pool,
            jwt_secret: config.jwt_secret.clone(),
            google: Arc::new(GoogleConfig::from_config(config)),
            http: reqwest::Client::new(),
            rate_limiter: RateLimiter::new(),
            frontend_url: config.frontend_url.trim_end_matches('/').to_string(),
        }
    }
}
