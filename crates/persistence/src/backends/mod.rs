//! Database backend implementations.
//!
//! Each backend implements [`VersionedResourceRepository`] and is gated
//! behind a feature flag.
//!
//! # Available Backends
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | SQLite | `sqlite` | Embedded database, in-memory or file-based |
//! | PostgreSQL | `postgres` | Server RDBMS with JSONB payload storage |
//!
//! # Example
//!
//! ```no_run
//! use register_persistence::backends::open_repository;
//! use register_persistence::core::{ConcurrencyStrategy, RepositoryConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RepositoryConfig::new("sqlite://./data/register.db")
//!     .with_concurrency(ConcurrencyStrategy::AdvisoryLock);
//! let repository = open_repository(&config).await?;
//! repository.health_check().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::core::{EngineKind, RepositoryConfig, VersionedResourceRepository};
use crate::error::{BackendError, StorageError, StorageResult};

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

/// Opens the repository named by the configuration's connection string and
/// brings its schema up to date.
///
/// # Errors
///
/// * `StorageError::Backend(UnsupportedEngine)` - If the connection string names
///   an engine that is unknown or not compiled in
/// * `StorageError::Backend(ConnectionFailed)` - If the database cannot be reached
pub async fn open_repository(
    config: &RepositoryConfig,
) -> StorageResult<Arc<dyn VersionedResourceRepository>> {
    let engine = config.engine()?;

    let repository: Arc<dyn VersionedResourceRepository> = match engine {
        #[cfg(feature = "sqlite")]
        EngineKind::Sqlite => {
            let backend = sqlite::SqliteBackend::from_repository_config(config)?;
            backend.init_schema()?;
            Arc::new(backend)
        }
        #[cfg(feature = "postgres")]
        EngineKind::Postgres => {
            let backend = postgres::PostgresBackend::from_repository_config(config).await?;
            backend.init_schema().await?;
            Arc::new(backend)
        }
        #[allow(unreachable_patterns)]
        other => {
            return Err(StorageError::Backend(BackendError::UnsupportedEngine {
                engine: other.to_string(),
            }));
        }
    };

    tracing::info!(
        engine = %engine,
        strategy = %repository.strategy(),
        "Repository ready"
    );

    Ok(repository)
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::core::ConcurrencyStrategy;

    #[tokio::test]
    async fn test_open_in_memory_repository() {
        let config = RepositoryConfig::default().with_concurrency(ConcurrencyStrategy::AdvisoryLock);
        let repository = open_repository(&config).await.unwrap();
        assert_eq!(repository.backend_name(), "sqlite");
        assert_eq!(repository.strategy(), ConcurrencyStrategy::AdvisoryLock);
        repository.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_unknown_engine() {
        let config = RepositoryConfig::new("mongodb://localhost/register");
        let err = open_repository(&config).await.err().unwrap();
        assert!(matches!(
            err,
            StorageError::Backend(BackendError::UnsupportedEngine { .. })
        ));
    }
}
