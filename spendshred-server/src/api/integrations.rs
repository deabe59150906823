//! Third-party integration stubs and portfolio analysis

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::AnalysisSummary;

use crate::db;
use crate::services::stats::analyze as analyze_portfolio;
use crate::state::AppState;

use super::ApiResult;

#[derive(Deserialize)]
pub struct ConnectRequest {
    pub service: String,
    #[serde(rename = "apiKey")]
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub status: &'static str,
    pub service: String,
}

/// POST /integrations/connect
///
/// Accounting integrations are not wired to a provider yet; any key is
/// accepted unless it looks like a failure marker.
pub async fn connect(Json(req): Json<ConnectRequest>) -> ApiResult<ConnectResponse> {
    if req.service.trim().is_empty() {
        return Err(AppError::new(ErrorCode::RequiredField).with_detail("field", "service"));
    }
    if req.api_key.contains("error") {
        tracing::warn!(service = %req.service, "Integration connection rejected");
        return Err(AppError::with_message(
            ErrorCode::IntegrationConnectionFailed,
            "Invalid API Key or Connection Failed",
        ));
    }
    Ok(Json(ConnectResponse {
        status: "connected",
        service: req.service,
    }))
}

/// POST /integrations/analyze
pub async fn analyze(State(state): State<AppState>) -> ApiResult<AnalysisSummary> {
    let subs = db::subscriptions::list(&state.pool).await.map_err(|e| {
        tracing::error!("Analysis query error: {e}");
        AppError::new(ErrorCode::DatabaseError)
    })?;
    Ok(Json(analyze_portfolio(&subs)))
}
