//! If-Match header extractor.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::error::RestError;
use crate::responses::parse_if_match;

/// Axum extractor for the version named by `If-Match`, if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct IfMatch(pub Option<u64>);

impl<S> FromRequestParts<S> for IfMatch
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(header::IF_MATCH) else {
            return Ok(IfMatch(None));
        };

        value
            .to_str()
            .ok()
            .and_then(parse_if_match)
            .map(|version| IfMatch(Some(version)))
            .ok_or_else(|| RestError::BadRequest {
                message: "If-Match must name a version number".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(if_match: Option<&str>) -> Result<IfMatch, RestError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = if_match {
            builder = builder.header(header::IF_MATCH, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        IfMatch::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_if_match_absent() {
        assert_eq!(extract(None).await.unwrap().0, None);
    }

    #[tokio::test]
    async fn test_if_match_bare_version() {
        assert_eq!(extract(Some("2")).await.unwrap().0, Some(2));
    }

    #[tokio::test]
    async fn test_if_match_weak_etag() {
        assert_eq!(extract(Some("W/\"4\"")).await.unwrap().0, Some(4));
    }

    #[tokio::test]
    async fn test_if_match_garbage() {
        assert!(extract(Some("*")).await.is_err());
    }
}
