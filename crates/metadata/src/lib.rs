//! Metadata Register service layer.
//!
//! [`MetadataService`] is the single entry point for the HTTP layer. It runs
//! every write through the [`ValidationPipeline`] before handing it to a
//! [`VersionedResourceRepository`](register_persistence::core::VersionedResourceRepository),
//! and exposes the repository's reads unchanged.
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "sqlite")]
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use register_metadata::MetadataService;
//! use register_persistence::backends::sqlite::SqliteBackend;
//! use serde_json::json;
//!
//! let backend = SqliteBackend::in_memory()?;
//! backend.init_schema()?;
//! let service = MetadataService::new(Arc::new(backend));
//!
//! let payload = json!({"resourceType": "Patient", "id": "123", "name": [{"family": "Smith"}]});
//! let entry = service.update("Patient", "123", payload, None, None).await?;
//! assert_eq!(entry.version(), 1);
//!
//! // A payload addressed to the wrong kind never reaches the repository
//! let wrong = json!({"resourceType": "ImagingStudy", "id": "123"});
//! assert!(service.update("Patient", "123", wrong, None, None).await.is_err());
//! # Ok(())
//! # }
//! ```

pub mod service;
pub mod validation;

pub use service::{LATEST_VERSION, MetadataService};
pub use validation::{ValidationPipeline, Validator};
