//! Pretty-print flag extractor.

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

use crate::error::RestError;

/// Axum extractor for the `_pretty` query flag. Absent means `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pretty(pub bool);

#[derive(Debug, Deserialize)]
struct PrettyQuery {
    #[serde(rename = "_pretty", default)]
    pretty: bool,
}

impl<S> FromRequestParts<S> for Pretty
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<PrettyQuery>::from_request_parts(parts, state)
            .await
            .map_err(|_| RestError::BadRequest {
                message: "_pretty must be true or false".to_string(),
            })?;
        Ok(Pretty(query.pretty))
    }
}
