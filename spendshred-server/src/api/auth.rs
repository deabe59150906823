//! Account endpoints: register, login, profile update

use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};

use crate::auth::UserIdentity;
use crate::auth::user_auth::create_token;
use crate::db::{self, users::User};
use crate::state::AppState;
use crate::util::{hash_password, verify_password};

use super::ApiResult;

const MIN_PASSWORD_LEN: usize = 8;

/// Token issued by every account endpoint
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user_name: String,
}

pub(crate) fn token_response(state: &AppState, user: &User) -> Result<TokenResponse, AppError> {
    let access_token = create_token(user.id, &user.email, &state.jwt_secret).map_err(|e| {
        tracing::error!("JWT creation failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;
    Ok(TokenResponse {
        access_token,
        token_type: "bearer",
        user_name: user.display_name().to_string(),
    })
}

fn check_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort)
            .with_detail("min_length", MIN_PASSWORD_LEN));
    }
    Ok(())
}

fn hash(password: &str) -> Result<String, AppError> {
    hash_password(password).map_err(|e| {
        tracing::error!("Password hashing failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })
}

/// POST /auth/register
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<TokenResponse> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::validation("A valid email is required").with_detail("field", "email"));
    }
    check_password(&req.password)?;

    let existing = db::users::find_by_email(&state.pool, &email)
        .await
        .map_err(|e| {
            tracing::error!("DB error during registration: {e}");
            AppError::new(ErrorCode::DatabaseError)
        })?;
    if existing.is_some() {
        return Err(AppError::new(ErrorCode::EmailAlreadyRegistered));
    }

    let full_name = req
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let hashed = hash(&req.password)?;
    let user = db::users::create(
        &state.pool,
        &email,
        full_name,
        &hashed,
        shared::util::now_millis(),
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to create user: {e}");
        AppError::new(ErrorCode::DatabaseError)
    })?;

    tracing::info!(user_id = user.id, "User registered");
    Ok(Json(token_response(&state, &user)?))
}

/// POST /auth/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let email = req.email.trim().to_lowercase();
    let user = db::users::find_by_email(&state.pool, &email)
        .await
        .map_err(|e| {
            tracing::error!("DB error during login: {e}");
            AppError::new(ErrorCode::DatabaseError)
        })?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(&req.password, &user.hashed_password) {
        return Err(AppError::invalid_credentials());
    }

    Ok(Json(token_response(&state, &user)?))
}

/// PUT /auth/me
#[derive(Deserialize)]
pub struct UpdateMeRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(req): Json<UpdateMeRequest>,
) -> ApiResult<TokenResponse> {
    let full_name = req
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let hashed = match req.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => {
            check_password(password)?;
            Some(hash(password)?)
        }
        None => None,
    };

    let user = db::users::update_profile(&state.pool, identity.user_id, full_name, hashed.as_deref())
        .await
        .map_err(|e| {
            tracing::error!("Profile update error: {e}");
            AppError::new(ErrorCode::DatabaseError)
        })?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    Ok(Json(token_response(&state, &user)?))
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};
    use serde_json::json;

    use crate::api::test_support::TestApp;

    #[tokio::test]
    async fn register_then_login() {
        let app = TestApp::new().await;
        let token = app.register("Ada@Example.com").await;
        assert!(!token.is_empty());

        let (status, body) = app
            .call(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({ "email": "ada@example.com", "password": "hunter2hunter2" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "bearer");
        assert_eq!(body["user_name"], "Test User");
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let app = TestApp::new().await;
        app.register("ada@example.com").await;

        let (status, body) = app
            .call(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({ "email": "ada@example.com", "password": "whatever123" })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], 1006);
    }

    #[tokio::test]
    async fn bad_credentials_are_rejected() {
        let app = TestApp::new().await;
        app.register("ada@example.com").await;

        for (email, password) in [("ada@example.com", "wrong-password"), ("nobody@x.io", "hunter2hunter2")] {
            let (status, body) = app
                .call(
                    Method::POST,
                    "/api/v1/auth/login",
                    None,
                    Some(json!({ "email": email, "password": password })),
                )
                .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["code"], 1002);
        }
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let app = TestApp::new().await;
        let (status, body) = app
            .call(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({ "email": "a@b.io", "password": "short" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 1008);
    }

    #[tokio::test]
    async fn update_me_changes_name_and_password() {
        let app = TestApp::new().await;
        let token = app.register("ada@example.com").await;

        let (status, body) = app
            .call(
                Method::PUT,
                "/api/v1/auth/me",
                Some(&token),
                Some(json!({ "full_name": "Ada Lovelace", "password": "analytical-engine" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_name"], "Ada Lovelace");

        let (status, _) = app
            .call(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({ "email": "ada@example.com", "password": "analytical-engine" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn register_is_rate_limited() {
        let app = TestApp::new().await;
        let mut last = StatusCode::OK;
        for i in 0..4 {
            let (status, _) = app
                .call(
                    Method::POST,
                    "/api/v1/auth/register",
                    None,
                    Some(json!({ "email": format!("u{i}@x.io"), "password": "hunter2hunter2" })),
                )
                .await;
            last = status;
        }
        assert_eq!(last, StatusCode::TOO_MANY_REQUESTS);
    }
}
