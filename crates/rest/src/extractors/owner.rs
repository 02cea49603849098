//! Pseudonym query parameter extractor.

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use register_persistence::types::Pseudonym;
use serde::Deserialize;

use crate::error::RestError;

/// Axum extractor for the optional `pseudonym` query parameter.
///
/// A present parameter must be a UUID; anything else is rejected with 400
/// before the handler runs.
///
/// # Example
///
/// ```rust,ignore
/// use register_rest::extractors::OwnerParam;
///
/// async fn handler(OwnerParam(pseudonym): OwnerParam) {
///     if let Some(pseudonym) = pseudonym {
///         println!("request scoped to {pseudonym}");
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct OwnerParam(pub Option<Pseudonym>);

#[derive(Debug, Deserialize)]
struct OwnerQuery {
    pseudonym: Option<String>,
}

impl OwnerParam {
    /// Returns the pseudonym, failing when the parameter was omitted.
    pub fn required(self) -> Result<Pseudonym, RestError> {
        self.0.ok_or_else(|| RestError::BadRequest {
            message: "pseudonym query parameter is required".to_string(),
        })
    }
}

impl<S> FromRequestParts<S> for OwnerParam
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<OwnerQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| RestError::BadRequest {
                message: format!("Invalid query parameters: {}", e.body_text()),
            })?;

        match query.pseudonym {
            None => Ok(OwnerParam(None)),
            Some(raw) => raw
                .parse::<Pseudonym>()
                .map(|p| OwnerParam(Some(p)))
                .map_err(|_| RestError::BadRequest {
                    message: "Badly formed pseudonym".to_string(),
                }),
        }
    }
}
