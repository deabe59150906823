//! Spend statistics

use axum::{Json, extract::State};
use shared::error::{AppError, ErrorCode};
use shared::models::SpendStats;

use crate::db;
use crate::services::stats::compute_stats;
use crate::state::AppState;

use super::ApiResult;

/// GET /stats
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<SpendStats> {
    let subs = db::subscriptions::list(&state.pool).await.map_err(|e| {
        tracing::error!("Stats query error: {e}");
        AppError::new(ErrorCode::DatabaseError)
    })?;
    Ok(Json(compute_stats(&subs)))
}
