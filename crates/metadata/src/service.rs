//! The metadata service facade.

use std::fmt::Debug;
use std::sync::Arc;

use register_persistence::core::VersionedResourceRepository;
use register_persistence::error::{ResourceError, StorageError, StorageResult};
use register_persistence::types::{Pseudonym, ResourceEntry, ResourceKey};
use serde_json::Value;
use tracing::{debug, warn};

use crate::validation::ValidationPipeline;

/// Version number that selects the latest version in [`MetadataService::search_by_version`].
pub const LATEST_VERSION: u64 = 0;

/// Entry point to the register.
///
/// Reads delegate straight to the repository. Writes pass the
/// [`ValidationPipeline`] first; a rejected payload never reaches the
/// repository, so it can neither create a row nor consume a version.
pub struct MetadataService<R: ?Sized = dyn VersionedResourceRepository> {
    repository: Arc<R>,
    pipeline: ValidationPipeline,
}

impl<R: VersionedResourceRepository + ?Sized> Debug for MetadataService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataService")
            .field("backend", &self.repository.backend_name())
            .field("strategy", &self.repository.strategy())
            .finish_non_exhaustive()
    }
}

impl<R: ?Sized> Clone for MetadataService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            pipeline: self.pipeline,
        }
    }
}

impl<R: VersionedResourceRepository + ?Sized> MetadataService<R> {
    /// Creates a service over the given repository.
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            pipeline: ValidationPipeline::new(),
        }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Returns every live version of `kind` resources owned by `owner`.
    pub async fn search_by_owner(
        &self,
        owner: &Pseudonym,
        kind: &str,
    ) -> StorageResult<Vec<ResourceEntry>> {
        self.repository.find_by_owner(owner, kind).await
    }

    /// Returns one version of a resource; [`LATEST_VERSION`] selects the latest.
    ///
    /// The latest version may be a tombstone; callers that must not expose
    /// deleted resources use [`read_latest`](Self::read_latest).
    ///
    /// # Errors
    ///
    /// * `ResourceError::NotFound` - If the key has no versions
    /// * `ResourceError::VersionNotFound` - If the key exists but not at `version`
    pub async fn search_by_version(
        &self,
        kind: &str,
        external_id: &str,
        version: u64,
    ) -> StorageResult<ResourceEntry> {
        if version == LATEST_VERSION {
            return self
                .repository
                .find_latest(kind, external_id)
                .await?
                .ok_or_else(|| not_found(kind, external_id));
        }

        if let Some(entry) = self
            .repository
            .find_version(kind, external_id, version)
            .await?
        {
            return Ok(entry);
        }

        // Distinguish an unknown key from a missing version of a known key.
        match self.repository.find_latest(kind, external_id).await? {
            Some(_) => {
                let key = ResourceKey::new(kind, external_id);
                Err(StorageError::Resource(ResourceError::VersionNotFound {
                    kind: key.kind().to_string(),
                    id: key.external_id().to_string(),
                    version,
                }))
            }
            None => Err(not_found(kind, external_id)),
        }
    }

    /// Returns the latest live version of a resource.
    ///
    /// # Errors
    ///
    /// * `ResourceError::NotFound` - If the key has no versions
    /// * `ResourceError::Gone` - If the latest version is a tombstone
    pub async fn read_latest(&self, kind: &str, external_id: &str) -> StorageResult<ResourceEntry> {
        let entry = self.search_by_version(kind, external_id, LATEST_VERSION).await?;
        if entry.is_deleted() {
            return Err(StorageError::Resource(ResourceError::Gone {
                kind: entry.kind().to_string(),
                id: entry.external_id().to_string(),
                deleted_at: Some(entry.created_at()),
            }));
        }
        Ok(entry)
    }

    /// Deletes a resource by appending a tombstone version.
    ///
    /// Deleting an already deleted resource succeeds without writing.
    ///
    /// # Errors
    ///
    /// * `ResourceError::NotFound` - If the key never existed
    pub async fn delete(&self, kind: &str, external_id: &str) -> StorageResult<()> {
        self.repository.delete(kind, external_id).await?;
        debug!(kind = %kind, external_id = %external_id, "Deleted resource");
        Ok(())
    }

    /// Validates a payload and stores it as the next version of its key.
    ///
    /// When `expected_version` is given, the write only succeeds if it is
    /// still the latest version of the key.
    ///
    /// # Errors
    ///
    /// * `StorageError::Validation` - If the payload fails validation; nothing is written
    /// * `ConcurrencyError::PreconditionFailed` - If `expected_version` is stale
    /// * `TransactionError::Timeout` - If the write could not commit in time; nothing is written
    pub async fn update(
        &self,
        kind: &str,
        external_id: &str,
        payload: Value,
        owner: Option<&Pseudonym>,
        expected_version: Option<u64>,
    ) -> StorageResult<ResourceEntry> {
        if let Err(e) = self.pipeline.validate(kind, external_id, &payload) {
            warn!(
                kind = %kind,
                external_id = %external_id,
                reason = %e,
                "Rejected resource write"
            );
            return Err(e.into());
        }

        let entry = self
            .repository
            .upsert_with_match(kind, external_id, payload, owner, expected_version)
            .await?;

        debug!(
            kind = %entry.kind(),
            external_id = %entry.external_id(),
            version = entry.version(),
            "Stored resource version"
        );

        Ok(entry)
    }

    /// Returns the ascending version numbers stored for a key.
    pub async fn list_versions(&self, kind: &str, external_id: &str) -> StorageResult<Vec<u64>> {
        self.repository.list_versions(kind, external_id).await
    }

    /// Checks that the backing engine is reachable.
    pub async fn health_check(&self) -> StorageResult<()> {
        self.repository.health_check().await
    }
}

fn not_found(kind: &str, external_id: &str) -> StorageError {
    let key = ResourceKey::new(kind, external_id);
    StorageError::Resource(ResourceError::NotFound {
        kind: key.kind().to_string(),
        id: key.external_id().to_string(),
    })
}
