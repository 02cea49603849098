//! Read interaction handler.
//!
//! `GET /resource/[kind]/[id]`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use tracing::debug;

use crate::error::RestResult;
use crate::extractors::Pretty;
use crate::responses::{ResourceHeaders, format_resource_response};
use crate::state::AppState;

/// Handler for the read interaction.
///
/// Returns the latest version of a resource.
///
/// # Response
///
/// - `200 OK` - Resource found, with `ETag` and `Last-Modified`
/// - `404 Not Found` - Resource does not exist
/// - `410 Gone` - Resource was deleted
pub async fn read_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    Pretty(pretty): Pretty,
) -> RestResult<Response> {
    debug!(kind = %kind, id = %id, "Processing read request");

    let entry = state.service().read_latest(&kind, &id).await?;

    debug!(
        kind = %kind,
        id = %id,
        version = entry.version(),
        "Returning resource"
    );

    let headers = ResourceHeaders::from_entry(&entry);
    format_resource_response(
        StatusCode::OK,
        headers.to_header_map(),
        entry.payload(),
        pretty,
    )
}
