//! OAuth token queries (one Google credential per user)

use sqlx::{SqliteExecutor, SqlitePool};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OAuthToken {
    pub id: i64,
    pub user_id: i64,
    pub provider: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>,
    pub created_at: i64,
}

pub async fn find_by_user(pool: &SqlitePool, user_id: i64) -> Result<Option<OAuthToken>, sqlx::Error> {
    sqlx::query_as::<_, OAuthToken>(
        "SELECT id, user_id, provider, access_token, refresh_token, expires_at, created_at
         FROM oauth_tokens WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Store a fresh credential. A missing refresh token keeps the stored one,
/// since Google only returns it on first consent.
pub async fn upsert(
    pool: &SqlitePool,
    user_id: i64,
    access_token: &str,
    refresh_token: Option<&str>,
    expires_at: Option<i64>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO oauth_tokens (user_id, provider, access_token, refresh_token, expires_at, created_at)
         VALUES (?1, 'google', ?2, ?3, ?4, ?5)
         ON CONFLICT (user_id) DO UPDATE SET
            access_token = ?2,
            refresh_token = COALESCE(?3, oauth_tokens.refresh_token),
            expires_at = ?4",
    )
    .bind(user_id)
    .bind(access_token)
    .bind(refresh_token)
    .bind(expires_at)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Replace the access token after a mid-scan refresh
pub async fn update_access_token<'e>(
    exec: impl SqliteExecutor<'e>,
    id: i64,
    access_token: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE oauth_tokens SET access_token = ? WHERE id = ?")
        .bind(access_token)
        .bind(id)
        .execute(exec)
        .await?;
    Ok(())
}
