//! The versioned resource repository trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageResult;
use crate::types::{Pseudonym, ResourceEntry};

use super::strategy::ConcurrencyStrategy;

/// Append-only storage of versioned resources.
///
/// Rows are never modified once written. Every write, deletion included,
/// appends a new version to the key's sequence `1..N`; the repository owns the
/// allocation of that number through its [`ConcurrencyStrategy`].
///
/// Kinds and external ids are sanitized (wildcard characters removed) and
/// matched case-insensitively by every operation.
///
/// # Deletion
///
/// [`delete`](Self::delete) appends a tombstone version that carries the
/// last live payload with `deleted = true`. Earlier versions stay readable
/// through [`find_version`](Self::find_version); [`find_latest`](Self::find_latest)
/// returns the tombstone. A later [`upsert`](Self::upsert) appends a live
/// version after it.
///
/// # Example
///
/// ```ignore
/// use register_persistence::core::VersionedResourceRepository;
///
/// async fn example<R: VersionedResourceRepository>(repo: &R) -> StorageResult<()> {
///     let v1 = repo.upsert("Patient", "123", json!({"resourceType": "Patient", "id": "123"}), None).await?;
///     assert_eq!(v1.version(), 1);
///
///     // Only succeeds if nobody else wrote in between
///     let v2 = repo.upsert_with_match("Patient", "123", payload, None, Some(1)).await?;
///
///     repo.delete("Patient", "123").await?;
///     assert!(repo.find_latest("Patient", "123").await?.unwrap().is_deleted());
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait VersionedResourceRepository: Send + Sync {
    /// Returns a human-readable name for the backing engine.
    fn backend_name(&self) -> &'static str;

    /// Returns the version allocation strategy fixed at construction.
    fn strategy(&self) -> ConcurrencyStrategy;

    /// Returns the row with the highest version for the key.
    ///
    /// The row may be a tombstone; callers decide how to report that.
    async fn find_latest(&self, kind: &str, external_id: &str)
    -> StorageResult<Option<ResourceEntry>>;

    /// Returns the row with exactly this version, tombstone or not.
    async fn find_version(
        &self,
        kind: &str,
        external_id: &str,
        version: u64,
    ) -> StorageResult<Option<ResourceEntry>>;

    /// Returns every live row owned by `owner` for the kind, in insertion order.
    ///
    /// Keys whose latest version is a tombstone contribute no rows, and
    /// tombstone rows themselves are never returned.
    async fn find_by_owner(&self, owner: &Pseudonym, kind: &str)
    -> StorageResult<Vec<ResourceEntry>>;

    /// Appends a tombstone for the key.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(NotFound)` - If the key has no rows at all
    ///
    /// Deleting a key whose latest version is already a tombstone succeeds
    /// without writing anything.
    async fn delete(&self, kind: &str, external_id: &str) -> StorageResult<()>;

    /// Appends a new live version for the key.
    async fn upsert(
        &self,
        kind: &str,
        external_id: &str,
        payload: Value,
        owner: Option<&Pseudonym>,
    ) -> StorageResult<ResourceEntry> {
        self.upsert_with_match(kind, external_id, payload, owner, None)
            .await
    }

    /// Appends a new live version if the stored latest version equals
    /// `expected_version`.
    ///
    /// The comparison runs inside the write transaction, after the version
    /// number has been reserved, so it cannot race with a concurrent writer.
    /// `None` skips the check. A key with no rows accepts any expectation.
    ///
    /// # Errors
    ///
    /// * `StorageError::Concurrency(PreconditionFailed)` - If versions don't match
    async fn upsert_with_match(
        &self,
        kind: &str,
        external_id: &str,
        payload: Value,
        owner: Option<&Pseudonym>,
        expected_version: Option<u64>,
    ) -> StorageResult<ResourceEntry>;

    /// Lists all version numbers for the key in ascending order.
    async fn list_versions(&self, kind: &str, external_id: &str) -> StorageResult<Vec<u64>>;

    /// Checks that the backing engine is reachable.
    async fn health_check(&self) -> StorageResult<()>;
}
