//! Metadata Register Persistence Layer
//!
//! This crate stores resource payloads as an append-only sequence of
//! versions per `(kind, external id)` key. Writers on the same key never
//! receive the same version number, versions per key are contiguous from 1,
//! and a committed version is never modified afterwards.
//!
//! # Features
//!
//! - **Backends**: SQLite (default) and PostgreSQL behind feature flags
//! - **Concurrency strategies**: atomic upsert or lock-then-insert version allocation
//! - **Optimistic locking**: compare-and-swap writes against an expected version
//! - **Tombstones**: deletes append a version marked deleted
//!
//! # Architecture
//!
//! - [`types`] - Keys, pseudonyms and stored resource entries
//! - [`error`] - Error types for all operations
//! - [`core`] - The repository trait, concurrency strategies and configuration
//! - [`backends`] - Backend implementations (SQLite, PostgreSQL)
//!
//! # Quick Start
//!
//! ```
//! # #[cfg(feature = "sqlite")]
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use register_persistence::backends::sqlite::SqliteBackend;
//! use register_persistence::core::VersionedResourceRepository;
//! use serde_json::json;
//!
//! let backend = SqliteBackend::in_memory()?;
//! backend.init_schema()?;
//!
//! let v1 = backend
//!     .upsert("Patient", "p1", json!({"resourceType": "Patient", "id": "p1"}), None)
//!     .await?;
//! assert_eq!(v1.version(), 1);
//! assert_eq!(v1.url(), "Patient/p1");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod error;
pub mod types;

pub use error::{StorageError, StorageResult};
