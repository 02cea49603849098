//! Error types for the persistence layer.
//!
//! This module defines all error types used by the register's storage,
//! following a hierarchy that separates resource state errors, concurrency
//! errors, validation errors, transaction errors and backend errors.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all storage operations.
///
/// This enum encompasses all possible errors that can occur while reading or
/// writing versioned resources, organized by category.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Resource state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Concurrency and versioning errors
    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),

    /// Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Transaction errors
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors related to resource state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// No row exists for the requested key.
    #[error("resource not found: {kind}/{id}")]
    NotFound { kind: String, id: String },

    /// The latest state of the key is a tombstone (HTTP 410 Gone).
    #[error("resource deleted: {kind}/{id}")]
    Gone {
        kind: String,
        id: String,
        deleted_at: Option<chrono::DateTime<chrono::Utc>>,
    },

    /// The requested version of the resource was not found.
    #[error("version not found: {kind}/{id}/_history/{version}")]
    VersionNotFound {
        kind: String,
        id: String,
        version: u64,
    },
}

/// Errors related to concurrency control.
#[derive(Error, Debug)]
pub enum ConcurrencyError {
    /// The caller's expected version does not match the stored latest version.
    #[error(
        "precondition failed for {kind}/{id}: expected version {expected_version}, found {actual_version}"
    )]
    PreconditionFailed {
        kind: String,
        id: String,
        expected_version: u64,
        actual_version: u64,
    },
}

/// Errors raised when a payload is rejected before it is written.
///
/// Both variants display as the bare reason so it can be surfaced to the
/// client unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A structural or domain business rule failed.
    #[error("{reason}")]
    Rejected { reason: String },

    /// The payload's declared kind does not match the addressed kind.
    #[error("{reason}")]
    InvalidResource { reason: String },
}

impl ValidationError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        ValidationError::Rejected {
            reason: reason.into(),
        }
    }

    pub fn invalid_resource(reason: impl Into<String>) -> Self {
        ValidationError::InvalidResource {
            reason: reason.into(),
        }
    }

    /// Returns the human-readable reason.
    pub fn reason(&self) -> &str {
        match self {
            ValidationError::Rejected { reason } | ValidationError::InvalidResource { reason } => {
                reason
            }
        }
    }
}

/// Errors related to transactions.
#[derive(Error, Debug)]
pub enum TransactionError {
    /// The write did not finish within the request deadline.
    #[error("transaction timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Transaction was rolled back.
    #[error("transaction rolled back: {reason}")]
    RolledBack { reason: String },
}

/// Errors originating from the database backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The connection string names an engine the register cannot drive.
    #[error("unsupported backing engine: {engine}")]
    UnsupportedEngine { engine: String },

    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Connection pool exhausted.
    #[error("connection pool exhausted for {backend_name}")]
    PoolExhausted { backend_name: String },

    /// Schema migration error.
    #[error("schema migration failed: {message}")]
    MigrationError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// Implement conversions from common error types

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StorageError {
    fn from(_err: r2d2::Error) -> Self {
        StorageError::Backend(BackendError::PoolExhausted {
            backend_name: "sqlite".to_string(),
        })
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for StorageError {
    fn from(err: tokio_postgres::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "postgres".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "postgres")]
impl From<deadpool_postgres::PoolError> for StorageError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        StorageError::Backend(BackendError::ConnectionFailed {
            backend_name: "postgres".to_string(),
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::Resource(ResourceError::NotFound {
            kind: "patient".to_string(),
            id: "999".to_string(),
        });
        assert_eq!(err.to_string(), "resource not found: patient/999");
    }

    #[test]
    fn test_validation_error_displays_bare_reason() {
        let err = ValidationError::invalid_resource(
            "resource type does not match the resource type in the URL",
        );
        assert_eq!(
            err.to_string(),
            "resource type does not match the resource type in the URL"
        );

        let err: StorageError = ValidationError::rejected("id is required in the resource data").into();
        assert_eq!(err.to_string(), "id is required in the resource data");
    }

    #[test]
    fn test_precondition_display() {
        let err = ConcurrencyError::PreconditionFailed {
            kind: "patient".to_string(),
            id: "123".to_string(),
            expected_version: 1,
            actual_version: 2,
        };
        assert!(err.to_string().contains("expected version 1, found 2"));
    }

    #[test]
    fn test_unsupported_engine_display() {
        let err = BackendError::UnsupportedEngine {
            engine: "mysql".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported backing engine: mysql");
    }
}
