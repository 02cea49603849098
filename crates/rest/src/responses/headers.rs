//! Response header generation.

use axum::http::{HeaderMap, HeaderValue, header};
use register_persistence::types::ResourceEntry;

/// Content type of every resource body.
pub const FHIR_JSON: &str = "application/fhir+json";

/// Builder for resource response headers.
///
/// The ETag is the bare version number of the entry, and Last-Modified is
/// the entry's creation time in RFC 3339.
#[derive(Debug, Default)]
pub struct ResourceHeaders {
    /// ETag value.
    etag: Option<String>,
    /// Last-Modified timestamp.
    last_modified: Option<String>,
    /// Location path (for writes).
    location: Option<String>,
    /// Content-Type.
    content_type: String,
}

impl ResourceHeaders {
    /// Creates a new ResourceHeaders builder.
    pub fn new() -> Self {
        Self {
            content_type: FHIR_JSON.to_string(),
            ..Default::default()
        }
    }

    /// Creates headers describing a stored version.
    pub fn from_entry(entry: &ResourceEntry) -> Self {
        Self::new()
            .with_version(entry.version())
            .with_last_modified(entry.created_at().to_rfc3339())
    }

    /// Sets the ETag from a version number.
    pub fn with_version(mut self, version: u64) -> Self {
        self.etag = Some(version.to_string());
        self
    }

    /// Sets the Last-Modified timestamp.
    pub fn with_last_modified(mut self, timestamp: impl Into<String>) -> Self {
        self.last_modified = Some(timestamp.into());
        self
    }

    /// Sets the Location path.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Converts to an Axum HeaderMap.
    pub fn to_header_map(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(value) = HeaderValue::from_str(&self.content_type) {
            headers.insert(header::CONTENT_TYPE, value);
        }

        if let Some(etag) = &self.etag {
            if let Ok(value) = HeaderValue::from_str(etag) {
                headers.insert(header::ETAG, value);
            }
        }

        if let Some(last_modified) = &self.last_modified {
            if let Ok(value) = HeaderValue::from_str(last_modified) {
                headers.insert(header::LAST_MODIFIED, value);
            }
        }

        if let Some(location) = &self.location {
            if let Ok(value) = HeaderValue::from_str(location) {
                headers.insert(header::LOCATION, value);
            }
        }

        headers
    }

    /// Returns the ETag value.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// Returns the Location value.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

/// Parses an `If-Match` value into a version number.
///
/// Accepts the bare number this server sends as its ETag, as well as the
/// quoted and weak forms (`"2"`, `W/"2"`).
pub fn parse_if_match(value: &str) -> Option<u64> {
    let value = value.trim();
    let value = value.strip_prefix("W/").unwrap_or(value);
    value.trim_matches('"').parse().ok()
}
