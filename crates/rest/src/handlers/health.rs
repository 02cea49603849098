//! Health check endpoint handler.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::state::AppState;

/// Handler for the health check endpoint.
///
/// # HTTP Request
///
/// `GET /health`
///
/// # Response
///
/// - `200 OK` - `{"status": "ok"}`, the database answered
/// - `503 Service Unavailable` - The database could not be reached
pub async fn health_handler(State(state): State<AppState>) -> Response {
    debug!("Processing health check request");

    match state.service().health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "backend": state.service().repository().backend_name()
            })),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "error",
                    "detail": e.to_string()
                })),
            )
                .into_response()
        }
    }
}
