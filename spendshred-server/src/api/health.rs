//! Liveness endpoints

use axum::Json;

/// GET /
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "SpendShred API is running" }))
}

/// GET /health
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "spendshred-server",
        "version": env!("CARGO_PKG_VERSION"),
        "git_hash": option_env!("GIT_HASH").unwrap_or("dev"),
    }))
}
