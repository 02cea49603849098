//! Patch interaction handler.

use axum::{extract::Path, http::StatusCode};
use tracing::debug;

/// Handler for `PATCH /resource/[kind]/[id]`.
///
/// Patching is not supported; clients send the full resource with PUT.
pub async fn patch_handler(Path((kind, id)): Path<(String, String)>) -> StatusCode {
    debug!(kind = %kind, id = %id, "Rejecting patch request");
    StatusCode::METHOD_NOT_ALLOWED
}
