use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::api::error_response;
use crate::infrastructure::AppState;
use crate::services::analytics_service;

#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Catalog counters", body = analytics_service::PublicStats)
    )
)]
pub async fn public_stats(State(state): State<AppState>) -> impl IntoResponse {
    match analytics_service::public_stats(state.db()).await {
        Ok(stats) => Json(json!({ "success": true, "data": stats })).into_response(),
        Err(e) => error_response(e, ""),
    }
}
