//! Google sign-in, Gmail connection status and inbox scan

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::Redirect,
};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::Subscription;

use crate::auth::UserIdentity;
use crate::db::{self, users::User};
use crate::error::ServiceError;
use crate::google::oauth;
use crate::services::scan::scan_user_inbox;
use crate::state::AppState;
use crate::util::{hash_password, random_password};

use super::ApiResult;
use super::auth::token_response;

/// GET /auth/google/login
pub async fn login(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let url = oauth::authorization_url(&state.google).map_err(|e| {
        tracing::error!("Failed to build Google consent URL: {e}");
        AppError::new(ErrorCode::ConfigError)
    })?;
    Ok(Redirect::temporary(&url))
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// GET /auth/google/callback
///
/// Exchanges the code, signs the Google account in (creating a local user
/// on first visit), stores the Gmail credential and hands a JWT to the
/// frontend.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, AppError> {
    if let Some(error) = query.error {
        tracing::warn!(error = %error, "Google consent declined");
        return Err(AppError::with_message(ErrorCode::OAuthExchangeFailed, error));
    }
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::new(ErrorCode::RequiredField).with_detail("field", "code"))?;

    let tokens = oauth::exchange_code(&state.http, &state.google, &code)
        .await
        .map_err(ServiceError::from)?;
    let info = oauth::fetch_userinfo(&state.http, &state.google, &tokens.access_token)
        .await
        .map_err(ServiceError::from)?;

    let user = find_or_create_user(&state, &info.email, info.name.as_deref()).await?;

    let now = shared::util::now_millis();
    db::oauth_tokens::upsert(
        &state.pool,
        user.id,
        &tokens.access_token,
        tokens.refresh_token.as_deref(),
        tokens.expires_at(now),
        now,
    )
    .await
    .map_err(ServiceError::from)?;
    tracing::info!(user_id = user.id, "Gmail connected");

    let token = token_response(&state, &user)?;
    let user_name = info.name.unwrap_or_else(|| user.display_name().to_string());
    let target = url::Url::parse_with_params(
        &format!("{}/google-callback", state.frontend_url),
        &[("token", token.access_token.as_str()), ("user", user_name.as_str())],
    )
    .map_err(|e| {
        tracing::error!("Invalid FRONTEND_URL: {e}");
        AppError::new(ErrorCode::ConfigError)
    })?;

    Ok(Redirect::temporary(target.as_str()))
}

async fn find_or_create_user(
    state: &AppState,
    email: &str,
    name: Option<&str>,
) -> Result<User, ServiceError> {
    let email = email.trim().to_lowercase();
    if let Some(user) = db::users::find_by_email(&state.pool, &email).await? {
        return Ok(user);
    }

    let hashed = hash_password(&random_password()).map_err(|e| {
        tracing::error!("Password hashing failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;
    let user = db::users::create(
        &state.pool,
        &email,
        name.filter(|n| !n.is_empty()),
        &hashed,
        shared::util::now_millis(),
    )
    .await?;
    tracing::info!(user_id = user.id, "User created from Google sign-in");
    Ok(user)
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub status: &'static str,
    pub found: usize,
    pub subscriptions: Vec<Subscription>,
}

/// GET /auth/google/scan
pub async fn scan(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<ScanResponse> {
    let outcome = scan_user_inbox(&state, identity.user_id).await?;
    Ok(Json(ScanResponse {
        status: "success",
        found: outcome.records.len(),
        subscriptions: outcome.records,
    }))
}

#[derive(Debug, Serialize)]
pub struct ConnectionsResponse {
    pub google: bool,
    pub quickbooks: bool,
    pub xero: bool,
}

/// GET /auth/connections
pub async fn connections(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<ConnectionsResponse> {
    let google = db::oauth_tokens::find_by_user(&state.pool, identity.user_id)
        .await
        .map_err(|e| {
            tracing::error!("OAuth token query error: {e}");
            AppError::new(ErrorCode::DatabaseError)
        })?
        .is_some();
    tracing::debug!(user_id = identity.user_id, google, "Connection status");

    Ok(Json(ConnectionsResponse {
        google,
        quickbooks: false,
        xero: false,
    }))
}
