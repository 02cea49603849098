//! Version read interaction handler.
//!
//! `GET /resource/[kind]/[id]/_history/[vid]`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use tracing::debug;

use crate::error::{RestError, RestResult};
use crate::extractors::Pretty;
use crate::responses::{ResourceHeaders, format_resource_response};
use crate::state::AppState;

/// Handler for the vread interaction.
///
/// Version `0` selects the latest version.
///
/// # Response
///
/// - `200 OK` - Version found
/// - `404 Not Found` - Resource or version does not exist
/// - `410 Gone` - The requested version is a tombstone
pub async fn vread_handler(
    State(state): State<AppState>,
    Path((kind, id, version)): Path<(String, String, u64)>,
    Pretty(pretty): Pretty,
) -> RestResult<Response> {
    debug!(kind = %kind, id = %id, version = version, "Processing vread request");

    let entry = state
        .service()
        .search_by_version(&kind, &id, version)
        .await?;

    if entry.is_deleted() {
        return Err(RestError::Gone { kind, id });
    }

    let headers = ResourceHeaders::from_entry(&entry);
    format_resource_response(
        StatusCode::OK,
        headers.to_header_map(),
        entry.payload(),
        pretty,
    )
}
