//! Error types for the register's HTTP API.
//!
//! Every error is rendered as a JSON body of the form `{"detail": "..."}`.
//!
//! # Error Mapping
//!
//! Storage errors from the service layer are mapped to HTTP status codes:
//!
//! | Storage Error | HTTP Status | Detail |
//! |--------------|-------------|--------|
//! | NotFound / VersionNotFound | 404 | `Metadata not found` |
//! | Gone | 410 | `Resource deleted` |
//! | PreconditionFailed | 412 | `Precondition Failed: Version mismatch` |
//! | Validation (Rejected / InvalidResource) | 400 | the rule's reason |
//! | Transaction Timeout | 503 | timeout message |
//! | Backend unavailable / pool exhausted | 503 | backend message |
//! | Other backend errors | 500 | backend message |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use register_persistence::error::{
    BackendError, ConcurrencyError, ResourceError, StorageError, TransactionError,
};
use std::fmt;
use tracing::error;

use crate::services::PseudonymError;

/// The primary error type for HTTP API operations.
#[derive(Debug)]
pub enum RestError {
    /// No version of the resource exists (HTTP 404).
    NotFound {
        /// The resource kind.
        kind: String,
        /// The resource id.
        id: String,
    },

    /// The latest version of the resource is a tombstone (HTTP 410).
    Gone {
        /// The resource kind.
        kind: String,
        /// The resource id.
        id: String,
    },

    /// If-Match did not name the latest version (HTTP 412).
    PreconditionFailed {
        /// Version the client expected.
        expected_version: u64,
        /// Version actually stored.
        actual_version: u64,
    },

    /// Bad request - validation error or malformed input (HTTP 400).
    BadRequest {
        /// Error message, returned to the client verbatim.
        message: String,
    },

    /// An upstream collaborator failed (HTTP 502).
    BadGateway {
        /// Error message.
        message: String,
    },

    /// The database could not serve the request in time (HTTP 503).
    ServiceUnavailable {
        /// Error message.
        message: String,
    },

    /// Internal server error (HTTP 500).
    InternalError {
        /// Error message.
        message: String,
    },
}

impl RestError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::NotFound { .. } => StatusCode::NOT_FOUND,
            RestError::Gone { .. } => StatusCode::GONE,
            RestError::PreconditionFailed { .. } => StatusCode::PRECONDITION_FAILED,
            RestError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            RestError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            RestError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            RestError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the text sent to the client in the `detail` field.
    pub fn detail(&self) -> String {
        match self {
            RestError::NotFound { .. } => "Metadata not found".to_string(),
            RestError::Gone { .. } => "Resource deleted".to_string(),
            RestError::PreconditionFailed { .. } => {
                "Precondition Failed: Version mismatch".to_string()
            }
            RestError::BadRequest { message }
            | RestError::BadGateway { message }
            | RestError::ServiceUnavailable { message }
            | RestError::InternalError { message } => message.clone(),
        }
    }
}

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestError::NotFound { kind, id } => {
                write!(f, "Resource not found: {}/{}", kind, id)
            }
            RestError::Gone { kind, id } => {
                write!(f, "Resource deleted: {}/{}", kind, id)
            }
            RestError::PreconditionFailed {
                expected_version,
                actual_version,
            } => {
                write!(
                    f,
                    "Precondition failed: expected version {}, found {}",
                    expected_version, actual_version
                )
            }
            RestError::BadRequest { message } => {
                write!(f, "Bad request: {}", message)
            }
            RestError::BadGateway { message } => {
                write!(f, "Bad gateway: {}", message)
            }
            RestError::ServiceUnavailable { message } => {
                write!(f, "Service unavailable: {}", message)
            }
            RestError::InternalError { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for RestError {}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }

        let body = serde_json::json!({ "detail": self.detail() });
        (status, Json(body)).into_response()
    }
}

// Implement conversions from storage errors

impl From<StorageError> for RestError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Resource(e) => e.into(),
            StorageError::Concurrency(e) => e.into(),
            StorageError::Validation(e) => RestError::BadRequest {
                message: e.reason().to_string(),
            },
            StorageError::Transaction(e) => e.into(),
            StorageError::Backend(e) => e.into(),
        }
    }
}

impl From<ResourceError> for RestError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::NotFound { kind, id } | ResourceError::VersionNotFound { kind, id, .. } => {
                RestError::NotFound { kind, id }
            }
            ResourceError::Gone { kind, id, .. } => RestError::Gone { kind, id },
        }
    }
}

impl From<ConcurrencyError> for RestError {
    fn from(err: ConcurrencyError) -> Self {
        match err {
            ConcurrencyError::PreconditionFailed {
                expected_version,
                actual_version,
                ..
            } => RestError::PreconditionFailed {
                expected_version,
                actual_version,
            },
        }
    }
}

impl From<TransactionError> for RestError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::Timeout { .. } => RestError::ServiceUnavailable {
                message: err.to_string(),
            },
            TransactionError::RolledBack { .. } => RestError::InternalError {
                message: err.to_string(),
            },
        }
    }
}

impl From<BackendError> for RestError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unavailable { .. }
            | BackendError::ConnectionFailed { .. }
            | BackendError::PoolExhausted { .. } => RestError::ServiceUnavailable {
                message: err.to_string(),
            },
            _ => RestError::InternalError {
                message: err.to_string(),
            },
        }
    }
}

impl From<PseudonymError> for RestError {
    fn from(err: PseudonymError) -> Self {
        RestError::BadGateway {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for RestError {
    fn from(err: serde_json::Error) -> Self {
        RestError::BadRequest {
            message: format!("Invalid JSON: {}", err),
        }
    }
}

/// Result type alias for HTTP API operations.
pub type RestResult<T> = Result<T, RestError>;

#[cfg(test)]
mod tests {
    use super::*;
    use register_persistence::error::ValidationError;

    #[test]
    fn test_not_found_display() {
        let err = RestError::NotFound {
            kind: "Patient".to_string(),
            id: "123".to_string(),
        };
        assert_eq!(err.to_string(), "Resource not found: Patient/123");
        assert_eq!(err.detail(), "Metadata not found");
    }

    #[test]
    fn test_validation_maps_to_bad_request_with_reason() {
        let err: RestError =
            StorageError::from(ValidationError::rejected("id is required in the resource data"))
                .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.detail(), "id is required in the resource data");

        let err: RestError = StorageError::from(ValidationError::invalid_resource(
            "resource type does not match the resource type in the URL",
        ))
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_resource_errors_map_to_status() {
        let gone: RestError = StorageError::from(ResourceError::Gone {
            kind: "Patient".to_string(),
            id: "1".to_string(),
            deleted_at: None,
        })
        .into();
        assert_eq!(gone.status_code(), StatusCode::GONE);
        assert_eq!(gone.detail(), "Resource deleted");

        let missing: RestError = StorageError::from(ResourceError::VersionNotFound {
            kind: "Patient".to_string(),
            id: "1".to_string(),
            version: 3,
        })
        .into();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_precondition_maps_to_412() {
        let err: RestError = StorageError::from(ConcurrencyError::PreconditionFailed {
            kind: "Patient".to_string(),
            id: "1".to_string(),
            expected_version: 1,
            actual_version: 2,
        })
        .into();
        assert_eq!(err.status_code(), StatusCode::PRECONDITION_FAILED);
        assert_eq!(err.detail(), "Precondition Failed: Version mismatch");
    }

    #[test]
    fn test_timeout_maps_to_503() {
        let err: RestError =
            StorageError::from(TransactionError::Timeout { timeout_ms: 100 }).into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_backend_internal_maps_to_500() {
        let err: RestError = StorageError::from(BackendError::MigrationError {
            message: "boom".to_string(),
        })
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_pseudonym_error_maps_to_502() {
        let err: RestError = PseudonymError::InvalidResponse.into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
