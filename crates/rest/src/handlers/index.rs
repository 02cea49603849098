//! Service banner and fallback handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

const BANNER: &str = r"
___  ___     _            _       _
|  \/  |    | |          | |     | |
| .  . | ___| |_ __ _  __| | __ _| |_ __ _
| |\/| |/ _ \ __/ _` |/ _` |/ _` | __/ _` |
| |  | |  __/ || (_| | (_| | (_| | || (_| |
\_|  |_/\___|\__\__,_|\__,_|\__,_|\__\__,_|
";

/// Handler for `GET /`: the service banner and version.
pub async fn index_handler() -> String {
    format!("{}\nVersion: {}\n", BANNER, env!("CARGO_PKG_VERSION"))
}

/// Handler for unknown routes.
pub async fn not_found_handler() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "detail": "Not Found" })),
    )
        .into_response()
}
