//! Gmail scan for one user, in one transaction

use chrono::NaiveDate;
use shared::error::{AppError, ErrorCode};
use sqlx::SqlitePool;

use crate::db::oauth_tokens::{self, OAuthToken};
use crate::error::ServiceResult;
use crate::google::GmailClient;
use crate::scanner::store::SqliteStore;
use crate::scanner::{Mailbox, ScanOutcome, run_scan};
use crate::state::AppState;

/// Scan the user's connected Gmail inbox and commit the findings
pub async fn scan_user_inbox(state: &AppState, user_id: i64) -> ServiceResult<ScanOutcome> {
    let token = oauth_tokens::find_by_user(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::GmailNotConnected))?;

    let mailbox = GmailClient::new(
        state.http.clone(),
        state.google.clone(),
        token.access_token.clone(),
        token.refresh_token.clone(),
    );

    tracing::info!(user_id, "Starting inbox scan");
    scan_with(&state.pool, &token, &mailbox, chrono::Local::now().date_naive()).await
}

/// Both passes plus the token rotation, committed together.
///
/// Any error drops the transaction, leaving the store untouched.
pub async fn scan_with<M: Mailbox + ?Sized>(
    pool: &SqlitePool,
    token: &OAuthToken,
    mailbox: &M,
    today: NaiveDate,
) -> ServiceResult<ScanOutcome> {
    let mut tx = pool.begin().await?;

    let outcome = {
        let mut store = SqliteStore::new(&mut tx);
        run_scan(mailbox, &mut store, &token.access_token, today).await?
    };

    if let Some(rotated) = &outcome.rotated_access_token {
        oauth_tokens::update_access_token(&mut *tx, token.id, rotated).await?;
        tracing::info!(user_id = token.user_id, "Stored refreshed Gmail access token");
    }

    tx.commit().await?;
    Ok(outcome)
}
