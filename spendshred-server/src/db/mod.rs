//! Database access layer
//!
//! Free async query functions over SQLite. Functions that take part in a
//! scan accept any executor so they run on the pool or inside a transaction.

pub mod oauth_tokens;
pub mod subscriptions;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// How long a writer waits on SQLite's single write lock. An inbox scan
/// holds it from its first insert until commit, across every Gmail round
/// trip, so this has to cover a full scan.
const BUSY_TIMEOUT: Duration = Duration::from_secs(60);

/// Open the pool (WAL, foreign keys) and apply embedded migrations
pub async fn connect(database_url: &str) -> Result<SqlitePool, BoxError> {
    let in_memory = database_url.contains(":memory:");
    let mut options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    // Every connection to sqlite::memory: is its own database
    let mut pool_options = SqlitePoolOptions::new().max_connections(5);
    if in_memory {
        pool_options = pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }
    let pool = pool_options.connect_with(options).await?;
    tracing::info!(in_memory, "Database connection established");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    connect("sqlite::memory:").await.unwrap()
}
