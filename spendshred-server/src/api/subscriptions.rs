//! Subscription CRUD

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{Subscription, SubscriptionCreate, SubscriptionUpdate};

use crate::db;
use crate::state::AppState;

use super::ApiResult;

/// GET /subscriptions
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Subscription>> {
    let subs = db::subscriptions::list(&state.pool).await.map_err(|e| {
        tracing::error!("Subscriptions query error: {e}");
        AppError::new(ErrorCode::DatabaseError)
    })?;
    Ok(Json(subs))
}

/// POST /subscriptions
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<SubscriptionCreate>,
) -> ApiResult<Subscription> {
    req.validate()?;

    let sub = db::subscriptions::insert(&state.pool, req)
        .await
        .map_err(|e| {
            tracing::error!("Create subscription error: {e}");
            AppError::new(ErrorCode::DatabaseError)
        })?;
    tracing::info!(id = sub.id, name = %sub.name, "Subscription created");
    Ok(Json(sub))
}

/// PATCH /subscriptions/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<SubscriptionUpdate>,
) -> ApiResult<Subscription> {
    let mut sub = db::subscriptions::find_by_id(&state.pool, id)
        .await
        .map_err(|e| {
            tracing::error!(id, "Subscription query error: {e}");
            AppError::new(ErrorCode::DatabaseError)
        })?
        .ok_or_else(|| AppError::new(ErrorCode::SubscriptionNotFound).with_detail("id", id))?;

    req.apply_to(&mut sub);
    sub.validate()?;

    let updated = db::subscriptions::update(&state.pool, &sub)
        .await
        .map_err(|e| {
            tracing::error!(id, "Update subscription error: {e}");
            AppError::new(ErrorCode::DatabaseError)
        })?;
    if !updated {
        return Err(AppError::new(ErrorCode::SubscriptionNotFound).with_detail("id", id));
    }
    Ok(Json(sub))
}
