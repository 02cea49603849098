//! Resource body rendering.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::error::{RestError, RestResult};

/// Builds a resource response, optionally pretty-printed.
///
/// The headers are applied after the body, so a `Content-Type` in `headers`
/// replaces the JSON default.
pub fn format_resource_response(
    status: StatusCode,
    headers: HeaderMap,
    content: &Value,
    pretty: bool,
) -> RestResult<Response> {
    let body = if pretty {
        serde_json::to_string_pretty(content)
    } else {
        serde_json::to_string(content)
    }
    .map_err(|e| RestError::InternalError {
        message: format!("Failed to serialize resource: {}", e),
    })?;

    Ok((status, headers, body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use serde_json::json;

    #[test]
    fn test_headers_override_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            "application/fhir+json".parse().unwrap(),
        );
        let response =
            format_resource_response(StatusCode::OK, headers, &json!({"id": "1"}), false).unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/fhir+json"
        );
    }
}
