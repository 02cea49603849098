//! Delete interaction handler.
//!
//! `DELETE /resource/[kind]/[id]`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::error::RestResult;
use crate::state::AppState;

/// Handler for the delete interaction.
///
/// Appends a tombstone; earlier versions stay readable through vread.
///
/// # Response
///
/// - `204 No Content` - Resource deleted (or already deleted)
/// - `404 Not Found` - Resource does not exist
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> RestResult<Response> {
    debug!(kind = %kind, id = %id, "Processing delete request");

    state.service().delete(&kind, &id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
