//! Update interaction handler.
//!
//! `PUT /resource/[kind]/[id]?pseudonym=[uuid]`

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::RestResult;
use crate::extractors::{IfMatch, OwnerParam};
use crate::responses::{ResourceHeaders, format_resource_response};
use crate::services::referral::DEFAULT_REQUESTING_UZI_NUMBER;
use crate::services::{CreateReferral, DataDomain};
use crate::state::AppState;

/// Handler for the update interaction.
///
/// Stores the body as the next version of the resource. With a
/// `pseudonym`, the pseudonym is exchanged first and the resource is stored
/// under the exchanged value; afterwards a referral is created for the
/// caller's pseudonym. A failed referral is logged and does not undo the
/// write.
///
/// # Headers
///
/// - `If-Match` - Only write if this is still the latest version
///
/// # Response
///
/// - `201 Created` - First version of the resource
/// - `200 OK` - A later version
/// - `400 Bad Request` - Malformed body or pseudonym, or a validation rule failed
/// - `412 Precondition Failed` - If-Match did not name the latest version
/// - `503 Service Unavailable` - The write timed out; nothing was stored
pub async fn update_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    OwnerParam(pseudonym): OwnerParam,
    IfMatch(expected_version): IfMatch,
    body: Bytes,
) -> RestResult<Response> {
    debug!(
        kind = %kind,
        id = %id,
        expected_version = ?expected_version,
        "Processing update request"
    );

    let payload: Value = serde_json::from_slice(&body)?;

    let owner = match &pseudonym {
        Some(pseudonym) => Some(
            state
                .pseudonyms()
                .exchange(pseudonym, state.provider_id())
                .await?,
        ),
        None => None,
    };

    let entry = state
        .service()
        .update(&kind, &id, payload, owner.as_ref(), expected_version)
        .await?;

    if let Some(pseudonym) = pseudonym {
        let referral = CreateReferral {
            pseudonym,
            data_domain: DataDomain::for_kind(&kind),
            ura_number: state.provider_id().to_string(),
            requesting_uzi_number: DEFAULT_REQUESTING_UZI_NUMBER.to_string(),
        };
        if let Err(e) = state.referrals().create_referral(referral).await {
            warn!(kind = %kind, id = %id, error = %e, "Referral was not created");
        }
    }

    let status = if entry.version() == 1 {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    let headers = ResourceHeaders::from_entry(&entry).with_location(format!(
        "/resource/{}/{}/_history/{}",
        kind,
        id,
        entry.version()
    ));

    debug!(
        kind = %kind,
        id = %id,
        version = entry.version(),
        "Resource stored"
    );

    format_resource_response(status, headers.to_header_map(), entry.payload(), false)
}
