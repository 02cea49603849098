//! VersionedResourceRepository implementation for PostgreSQL.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::GenericClient;
use serde_json::Value;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::core::{check_precondition, ConcurrencyStrategy, VersionedResourceRepository};
use crate::error::{BackendError, ResourceError, StorageError, StorageResult, TransactionError};
use crate::types::{sanitize, Pseudonym, ResourceEntry, ResourceKey};

use super::PostgresBackend;

const ENTRY_COLUMNS: &str =
    "e.id, e.owner, e.kind, e.external_id, e.payload, e.version, e.created_at, e.deleted";

fn internal_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "postgres".to_string(),
        message,
        source: None,
    })
}

/// Reads a version number column without panicking on a type mismatch.
fn version_column(row: &Row, idx: usize) -> StorageResult<u64> {
    row.try_get::<_, i64>(idx)
        .map(|v| v as u64)
        .map_err(|e| internal_error(format!("Failed to read version: {}", e)))
}

fn not_found(key: &ResourceKey) -> StorageError {
    StorageError::Resource(ResourceError::NotFound {
        kind: key.kind().to_string(),
        id: key.external_id().to_string(),
    })
}

fn row_to_entry(row: &Row) -> StorageResult<ResourceEntry> {
    let owner = row
        .try_get::<_, Option<String>>(1)
        .map_err(|e| internal_error(format!("Failed to read owner: {}", e)))?
        .map(|o| o.parse::<Pseudonym>())
        .transpose()
        .map_err(|e| {
            StorageError::Backend(BackendError::SerializationError {
                message: format!("Invalid owner: {}", e),
            })
        })?;

    let read = |e: tokio_postgres::Error| internal_error(format!("Failed to read row: {}", e));
    let id: Uuid = row.try_get(0).map_err(read)?;
    let kind: String = row.try_get(2).map_err(read)?;
    let external_id: String = row.try_get(3).map_err(read)?;
    let payload: Value = row.try_get(4).map_err(read)?;
    let version: i64 = row.try_get(5).map_err(read)?;
    let created_at: DateTime<Utc> = row.try_get(6).map_err(read)?;
    let deleted: bool = row.try_get(7).map_err(read)?;

    Ok(ResourceEntry::from_storage(
        id,
        owner,
        kind,
        external_id,
        payload,
        version as u64,
        created_at,
        deleted,
    ))
}

/// A version about to be appended to a key.
enum PendingWrite {
    Live {
        payload: Value,
        owner: Option<Pseudonym>,
        expected_version: Option<u64>,
    },
    Tombstone,
}

async fn read_version<C: GenericClient>(
    client: &C,
    key: &ResourceKey,
    version: u64,
) -> StorageResult<Option<ResourceEntry>> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM resource_entries e
         WHERE e.kind_key = $1 AND e.external_key = $2 AND e.version = $3"
    );
    let row = client
        .query_opt(
            sql.as_str(),
            &[&key.kind_key(), &key.external_key(), &(version as i64)],
        )
        .await
        .map_err(|e| internal_error(format!("Failed to read version: {}", e)))?;

    row.as_ref().map(row_to_entry).transpose()
}

async fn read_latest<C: GenericClient>(
    client: &C,
    key: &ResourceKey,
) -> StorageResult<Option<ResourceEntry>> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM resource_entries e
         WHERE e.kind_key = $1 AND e.external_key = $2
         ORDER BY e.version DESC
         LIMIT 1"
    );
    let row = client
        .query_opt(
            sql.as_str(),
            &[&key.kind_key(), &key.external_key()],
        )
        .await
        .map_err(|e| internal_error(format!("Failed to read latest version: {}", e)))?;

    row.as_ref().map(row_to_entry).transpose()
}

/// Reserves the next version with a single conflict-resolving insert.
///
/// The row lock taken by `ON CONFLICT DO UPDATE` is held until commit, so a
/// concurrent writer on the same key waits and then sees the bumped value.
async fn bump_head<C: GenericClient>(client: &C, key: &ResourceKey) -> StorageResult<u64> {
    let row = client
        .query_one(
            "INSERT INTO resource_heads (kind_key, external_key, version)
             VALUES ($1, $2, 1)
             ON CONFLICT (kind_key, external_key)
             DO UPDATE SET version = resource_heads.version + 1
             RETURNING version",
            &[&key.kind_key(), &key.external_key()],
        )
        .await
        .map_err(|e| internal_error(format!("Failed to reserve version: {}", e)))?;

    version_column(&row, 0)
}

/// Takes a transaction-scoped advisory lock on the key.
async fn lock_key<C: GenericClient>(client: &C, key: &ResourceKey) -> StorageResult<()> {
    client
        .execute(
            "SELECT pg_advisory_xact_lock(hashtext($1), hashtext($2))",
            &[&key.kind_key(), &key.external_key()],
        )
        .await
        .map_err(|e| internal_error(format!("Failed to acquire advisory lock: {}", e)))?;
    Ok(())
}

async fn max_version<C: GenericClient>(client: &C, key: &ResourceKey) -> StorageResult<u64> {
    let row = client
        .query_one(
            "SELECT COALESCE(MAX(version), 0) FROM resource_entries
             WHERE kind_key = $1 AND external_key = $2",
            &[&key.kind_key(), &key.external_key()],
        )
        .await
        .map_err(|e| internal_error(format!("Failed to read max version: {}", e)))?;

    version_column(&row, 0)
}

async fn set_head<C: GenericClient>(client: &C, key: &ResourceKey, version: u64) -> StorageResult<()> {
    client
        .execute(
            "INSERT INTO resource_heads (kind_key, external_key, version)
             VALUES ($1, $2, $3)
             ON CONFLICT (kind_key, external_key)
             DO UPDATE SET version = EXCLUDED.version",
            &[&key.kind_key(), &key.external_key(), &(version as i64)],
        )
        .await
        .map_err(|e| internal_error(format!("Failed to update version head: {}", e)))?;
    Ok(())
}

impl PostgresBackend {
    /// Picks the next version for the key inside the open write transaction.
    async fn reserve_version<C: GenericClient>(
        &self,
        client: &C,
        key: &ResourceKey,
    ) -> StorageResult<u64> {
        match self.config().concurrency {
            ConcurrencyStrategy::AtomicUpsert => bump_head(client, key).await,
            ConcurrencyStrategy::AdvisoryLock => {
                lock_key(client, key).await?;
                let next = max_version(client, key).await? + 1;
                set_head(client, key, next).await?;
                Ok(next)
            }
        }
    }

    /// Reserves a version and inserts its row inside the open transaction.
    ///
    /// Returns `None` when a tombstone was requested for a key that is
    /// already deleted.
    async fn stage_version<C: GenericClient>(
        &self,
        tx: &C,
        key: &ResourceKey,
        write: PendingWrite,
    ) -> StorageResult<Option<ResourceEntry>> {
        let version = self.reserve_version(tx, key).await?;
        let previous = version - 1;

        let (payload, owner, deleted) = match write {
            PendingWrite::Live {
                payload,
                owner,
                expected_version,
            } => {
                check_precondition(key, expected_version, previous)?;
                (payload, owner, false)
            }
            PendingWrite::Tombstone => {
                let latest = read_version(tx, key, previous)
                    .await?
                    .ok_or_else(|| not_found(key))?;
                if latest.is_deleted() {
                    return Ok(None);
                }
                let owner = latest.owner().cloned();
                (latest.into_payload(), owner, true)
            }
        };

        let entry = ResourceEntry::from_storage(
            Uuid::new_v4(),
            owner,
            key.kind(),
            key.external_id(),
            payload,
            version,
            Utc::now(),
            deleted,
        );

        tx.execute(
            "INSERT INTO resource_entries
                (id, owner, kind, external_id, kind_key, external_key, payload, version, created_at, deleted)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            &[
                &entry.id(),
                &entry.owner().map(Pseudonym::as_str),
                &key.kind(),
                &key.external_id(),
                &key.kind_key(),
                &key.external_key(),
                entry.payload(),
                &(version as i64),
                &entry.created_at(),
                &deleted,
            ],
        )
        .await
        .map_err(|e| internal_error(format!("Failed to insert version: {}", e)))?;

        Ok(Some(entry))
    }

    /// Appends one version to the key in a single transaction.
    ///
    /// Everything before commit runs under the write timeout. A write that
    /// times out is rolled back; once commit starts it runs to completion.
    /// Commit time is not bounded here, so callers with their own deadline
    /// must leave room for it after `write_timeout_ms`.
    async fn append_version(
        &self,
        key: &ResourceKey,
        write: PendingWrite,
    ) -> StorageResult<Option<ResourceEntry>> {
        let timeout_ms = self.config().write_timeout_ms;
        let mut client = self.get_client().await?;

        // Dropping the transaction without commit rolls it back.
        let tx = client
            .transaction()
            .await
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        let staged = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.stage_version(&tx, key, write),
        )
        .await
        .map_err(|_| StorageError::Transaction(TransactionError::Timeout { timeout_ms }))??;

        let Some(entry) = staged else {
            return Ok(None);
        };

        tx.commit().await.map_err(|e| {
            StorageError::Transaction(TransactionError::RolledBack {
                reason: format!("Commit failed: {}", e),
            })
        })?;

        tracing::debug!(
            kind = key.kind(),
            external_id = key.external_id(),
            version = entry.version(),
            deleted = entry.is_deleted(),
            "Committed resource version"
        );

        Ok(Some(entry))
    }
}

#[async_trait]
impl VersionedResourceRepository for PostgresBackend {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    fn strategy(&self) -> ConcurrencyStrategy {
        self.config().concurrency
    }

    async fn find_latest(
        &self,
        kind: &str,
        external_id: &str,
    ) -> StorageResult<Option<ResourceEntry>> {
        let client = self.get_client().await?;
        read_latest(&client, &ResourceKey::new(kind, external_id)).await
    }

    async fn find_version(
        &self,
        kind: &str,
        external_id: &str,
        version: u64,
    ) -> StorageResult<Option<ResourceEntry>> {
        let client = self.get_client().await?;
        read_version(&client, &ResourceKey::new(kind, external_id), version).await
    }

    async fn find_by_owner(
        &self,
        owner: &Pseudonym,
        kind: &str,
    ) -> StorageResult<Vec<ResourceEntry>> {
        let client = self.get_client().await?;
        let kind_key = sanitize(kind).to_lowercase();

        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM resource_entries e
             JOIN resource_heads h
               ON h.kind_key = e.kind_key AND h.external_key = e.external_key
             JOIN resource_entries l
               ON l.kind_key = h.kind_key AND l.external_key = h.external_key
              AND l.version = h.version
             WHERE e.owner = $1 AND e.kind_key = $2
               AND NOT e.deleted AND NOT l.deleted
             ORDER BY e.seq ASC"
        );
        let rows = client
            .query(
                sql.as_str(),
                &[&owner.as_str(), &kind_key],
            )
            .await
            .map_err(|e| internal_error(format!("Failed to search by owner: {}", e)))?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn delete(&self, kind: &str, external_id: &str) -> StorageResult<()> {
        let key = ResourceKey::new(kind, external_id);
        if self
            .append_version(&key, PendingWrite::Tombstone)
            .await?
            .is_none()
        {
            tracing::debug!(kind = key.kind(), external_id = key.external_id(), "Resource already deleted");
        }
        Ok(())
    }

    async fn upsert_with_match(
        &self,
        kind: &str,
        external_id: &str,
        payload: Value,
        owner: Option<&Pseudonym>,
        expected_version: Option<u64>,
    ) -> StorageResult<ResourceEntry> {
        let key = ResourceKey::new(kind, external_id);
        let write = PendingWrite::Live {
            payload,
            owner: owner.cloned(),
            expected_version,
        };
        self.append_version(&key, write)
            .await?
            .ok_or_else(|| internal_error("Live write produced no version".to_string()))
    }

    async fn list_versions(&self, kind: &str, external_id: &str) -> StorageResult<Vec<u64>> {
        let client = self.get_client().await?;
        let key = ResourceKey::new(kind, external_id);

        let rows = client
            .query(
                "SELECT version FROM resource_entries
                 WHERE kind_key = $1 AND external_key = $2
                 ORDER BY version ASC",
                &[&key.kind_key(), &key.external_key()],
            )
            .await
            .map_err(|e| internal_error(format!("Failed to list versions: {}", e)))?;

        rows.iter().map(|r| version_column(r, 0)).collect()
    }

    async fn health_check(&self) -> StorageResult<()> {
        let client = self.get_client().await.map_err(|_| {
            StorageError::Backend(BackendError::Unavailable {
                backend_name: "postgres".to_string(),
                message: "Failed to get connection".to_string(),
            })
        })?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| internal_error(format!("Health check failed: {}", e)))?;
        Ok(())
    }
}
