//! Search interaction handler.
//!
//! `GET /resource/[kind]/_search?pseudonym=[uuid]`

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::error::RestResult;
use crate::extractors::OwnerParam;
use crate::responses::BundleBuilder;
use crate::state::AppState;

/// Handler for the search interaction.
///
/// Exchanges the pseudonym and returns every live resource of the kind
/// stored under the exchanged value, as a searchset Bundle.
///
/// # Response
///
/// - `200 OK` - Bundle, possibly empty
/// - `400 Bad Request` - Missing or malformed pseudonym
pub async fn search_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    owner: OwnerParam,
) -> RestResult<Response> {
    let pseudonym = owner.required()?;
    debug!(kind = %kind, pseudonym = %pseudonym, "Processing search request");

    let owner = state
        .pseudonyms()
        .exchange(&pseudonym, state.provider_id())
        .await?;

    let entries = state.service().search_by_owner(&owner, &kind).await?;

    debug!(kind = %kind, count = entries.len(), "Search complete");

    let bundle = entries
        .into_iter()
        .fold(BundleBuilder::searchset(), |bundle, entry| {
            bundle.add_resource(entry.into_payload())
        })
        .build();

    Ok((StatusCode::OK, Json(bundle)).into_response())
}
