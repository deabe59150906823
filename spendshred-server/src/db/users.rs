//! User queries

use sqlx::SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub hashed_password: String,
    pub created_at: i64,
}

impl User {
    /// Name shown in the UI: full name, or the email when unset
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.email,
        }
    }
}

const COLUMNS: &str = "id, email, full_name, hashed_password, created_at";

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = ?"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(
    pool: &SqlitePool,
    email: &str,
    full_name: Option<&str>,
    hashed_password: &str,
    now: i64,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (email, full_name, hashed_password, created_at)
         VALUES (?, ?, ?, ?)
         RETURNING {COLUMNS}"
    ))
    .bind(email)
    .bind(full_name)
    .bind(hashed_password)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Update name and/or password hash; `None` keeps the stored value
pub async fn update_profile(
    pool: &SqlitePool,
    id: i64,
    full_name: Option<&str>,
    hashed_password: Option<&str>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users
         SET full_name = COALESCE(?, full_name), hashed_password = COALESCE(?, hashed_password)
         WHERE id = ?
         RETURNING {COLUMNS}"
    ))
    .bind(full_name)
    .bind(hashed_password)
    .bind(id)
    .fetch_optional(pool)
    .await
}
