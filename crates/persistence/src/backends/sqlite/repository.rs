//! VersionedResourceRepository implementation for SQLite.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use serde_json::Value;
use uuid::Uuid;

use crate::core::{check_precondition, ConcurrencyStrategy, VersionedResourceRepository};
use crate::error::{BackendError, ResourceError, StorageError, StorageResult, TransactionError};
use crate::types::{sanitize, Pseudonym, ResourceEntry, ResourceKey};

use super::SqliteBackend;

const ENTRY_COLUMNS: &str =
    "e.id, e.owner, e.kind, e.external_id, e.payload, e.version, e.created_at, e.deleted";

fn internal_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "sqlite".to_string(),
        message,
        source: None,
    })
}

fn serialization_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::SerializationError { message })
}

fn not_found(key: &ResourceKey) -> StorageError {
    StorageError::Resource(ResourceError::NotFound {
        kind: key.kind().to_string(),
        id: key.external_id().to_string(),
    })
}

/// Raw column values of one `resource_entries` row.
struct EntryRow {
    id: String,
    owner: Option<String>,
    kind: String,
    external_id: String,
    payload: Vec<u8>,
    version: i64,
    created_at: String,
    deleted: bool,
}

impl EntryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner: row.get(1)?,
            kind: row.get(2)?,
            external_id: row.get(3)?,
            payload: row.get(4)?,
            version: row.get(5)?,
            created_at: row.get(6)?,
            deleted: row.get(7)?,
        })
    }

    fn into_entry(self) -> StorageResult<ResourceEntry> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| serialization_error(format!("Invalid row id '{}': {}", self.id, e)))?;

        let owner = self
            .owner
            .map(|o| o.parse::<Pseudonym>())
            .transpose()
            .map_err(|e| serialization_error(format!("Invalid owner: {}", e)))?;

        let payload: Value = serde_json::from_slice(&self.payload)
            .map_err(|e| serialization_error(format!("Failed to deserialize payload: {}", e)))?;

        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| internal_error(format!("Failed to parse created_at: {}", e)))?
            .with_timezone(&Utc);

        Ok(ResourceEntry::from_storage(
            id,
            owner,
            self.kind,
            self.external_id,
            payload,
            self.version as u64,
            created_at,
            self.deleted,
        ))
    }
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

fn read_version(
    conn: &Connection,
    key: &ResourceKey,
    version: u64,
) -> StorageResult<Option<ResourceEntry>> {
    conn.query_row(
        &format!(
            "SELECT {ENTRY_COLUMNS} FROM resource_entries e
             WHERE e.kind_key = ?1 AND e.external_key = ?2 AND e.version = ?3"
        ),
        params![key.kind_key(), key.external_key(), version as i64],
        EntryRow::from_row,
    )
    .optional()
    .map_err(|e| internal_error(format!("Failed to read version: {}", e)))?
    .map(EntryRow::into_entry)
    .transpose()
}

fn read_latest(conn: &Connection, key: &ResourceKey) -> StorageResult<Option<ResourceEntry>> {
    conn.query_row(
        &format!(
            "SELECT {ENTRY_COLUMNS} FROM resource_entries e
             WHERE e.kind_key = ?1 AND e.external_key = ?2
             ORDER BY e.version DESC
             LIMIT 1"
        ),
        params![key.kind_key(), key.external_key()],
        EntryRow::from_row,
    )
    .optional()
    .map_err(|e| internal_error(format!("Failed to read latest version: {}", e)))?
    .map(EntryRow::into_entry)
    .transpose()
}

/// Reserves the next version with a single conflict-resolving insert.
fn bump_head(conn: &Connection, key: &ResourceKey) -> StorageResult<u64> {
    let version: i64 = conn
        .query_row(
            "INSERT INTO resource_heads (kind_key, external_key, version)
             VALUES (?1, ?2, 1)
             ON CONFLICT (kind_key, external_key) DO UPDATE SET version = version + 1
             RETURNING version",
            params![key.kind_key(), key.external_key()],
            |row| row.get(0),
        )
        .map_err(|e| internal_error(format!("Failed to reserve version: {}", e)))?;
    Ok(version as u64)
}

fn max_version(conn: &Connection, key: &ResourceKey) -> StorageResult<u64> {
    let max: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM resource_entries
             WHERE kind_key = ?1 AND external_key = ?2",
            params![key.kind_key(), key.external_key()],
            |row| row.get(0),
        )
        .map_err(|e| internal_error(format!("Failed to read max version: {}", e)))?;
    Ok(max as u64)
}

fn set_head(conn: &Connection, key: &ResourceKey, version: u64) -> StorageResult<()> {
    let updated = conn
        .execute(
            "UPDATE resource_heads SET version = ?3 WHERE kind_key = ?1 AND external_key = ?2",
            params![key.kind_key(), key.external_key(), version as i64],
        )
        .map_err(|e| internal_error(format!("Failed to update version head: {}", e)))?;

    if updated == 0 {
        conn.execute(
            "INSERT INTO resource_heads (kind_key, external_key, version) VALUES (?1, ?2, ?3)",
            params![key.kind_key(), key.external_key(), version as i64],
        )
        .map_err(|e| internal_error(format!("Failed to insert version head: {}", e)))?;
    }

    Ok(())
}

impl SqliteBackend {
    /// Picks the next version for the key inside the open write transaction.
    fn reserve_version(&self, conn: &Connection, key: &ResourceKey) -> StorageResult<u64> {
        match self.config().concurrency {
            ConcurrencyStrategy::AtomicUpsert => bump_head(conn, key),
            ConcurrencyStrategy::AdvisoryLock => {
                let next = max_version(conn, key)? + 1;
                set_head(conn, key, next)?;
                Ok(next)
            }
        }
    }

    /// Appends one version to the key in a single transaction.
    ///
    /// Returns `None` when a tombstone was requested for a key that is
    /// already deleted; nothing is written in that case. A write that has not
    /// reached commit within the write timeout is rolled back. Commit itself
    /// runs after the deadline check and is not bounded by it.
    fn append_version(
        &self,
        key: &ResourceKey,
        write: PendingWrite,
    ) -> StorageResult<Option<ResourceEntry>> {
        let timeout_ms = self.config().write_timeout_ms;
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut conn = self.get_connection()?;

        // IMMEDIATE takes SQLite's write lock at BEGIN. For the advisory-lock
        // strategy this is the exclusive lock held across read-max and insert.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        let version = self.reserve_version(&tx, key)?;
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
                let latest = read_version(&tx, key, previous)?.ok_or_else(|| not_found(key))?;
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

        let data = serde_json::to_vec(entry.payload())
            .map_err(|e| serialization_error(format!("Failed to serialize payload: {}", e)))?;

        tx.execute(
            "INSERT INTO resource_entries
                (id, owner, kind, external_id, kind_key, external_key, payload, version, created_at, deleted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                entry.id().to_string(),
                entry.owner().map(Pseudonym::as_str),
                key.kind(),
                key.external_id(),
                key.kind_key(),
                key.external_key(),
                data,
                version as i64,
                entry.created_at().to_rfc3339(),
                deleted,
            ],
        )
        .map_err(|e| internal_error(format!("Failed to insert version: {}", e)))?;

        if Instant::now() >= deadline {
            // Dropping the transaction rolls back the reserved version.
            return Err(StorageError::Transaction(TransactionError::Timeout { timeout_ms }));
        }

        tx.commit().map_err(|e| {
            StorageError::Transaction(TransactionError::RolledBack {
                reason: format!("Commit failed: {}", e),
            })
        })?;

        tracing::debug!(
            kind = key.kind(),
            external_id = key.external_id(),
            version,
            deleted,
            "Committed resource version"
        );

        Ok(Some(entry))
    }
}

#[async_trait]
impl VersionedResourceRepository for SqliteBackend {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn strategy(&self) -> ConcurrencyStrategy {
        self.config().concurrency
    }

    async fn find_latest(
        &self,
        kind: &str,
        external_id: &str,
    ) -> StorageResult<Option<ResourceEntry>> {
        let conn = self.get_connection()?;
        read_latest(&conn, &ResourceKey::new(kind, external_id))
    }

    async fn find_version(
        &self,
        kind: &str,
        external_id: &str,
        version: u64,
    ) -> StorageResult<Option<ResourceEntry>> {
        let conn = self.get_connection()?;
        read_version(&conn, &ResourceKey::new(kind, external_id), version)
    }

    async fn find_by_owner(
        &self,
        owner: &Pseudonym,
        kind: &str,
    ) -> StorageResult<Vec<ResourceEntry>> {
        let conn = self.get_connection()?;
        let kind_key = sanitize(kind).to_lowercase();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM resource_entries e
                 JOIN resource_heads h
                   ON h.kind_key = e.kind_key AND h.external_key = e.external_key
                 JOIN resource_entries l
                   ON l.kind_key = h.kind_key AND l.external_key = h.external_key
                  AND l.version = h.version
                 WHERE e.owner = ?1 AND e.kind_key = ?2
                   AND e.deleted = 0 AND l.deleted = 0
                 ORDER BY e.seq ASC"
            ))
            .map_err(|e| internal_error(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![owner.as_str(), kind_key], EntryRow::from_row)
            .map_err(|e| internal_error(format!("Failed to search by owner: {}", e)))?;

        let mut entries = Vec::new();
        for row in rows {
            let row = row.map_err(|e| internal_error(format!("Failed to read row: {}", e)))?;
            entries.push(row.into_entry()?);
        }

        Ok(entries)
    }

    async fn delete(&self, kind: &str, external_id: &str) -> StorageResult<()> {
        let key = ResourceKey::new(kind, external_id);
        if self.append_version(&key, PendingWrite::Tombstone)?.is_none() {
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
        self.append_version(&key, write)?
            .ok_or_else(|| internal_error("Live write produced no version".to_string()))
    }

    async fn list_versions(&self, kind: &str, external_id: &str) -> StorageResult<Vec<u64>> {
        let conn = self.get_connection()?;
        let key = ResourceKey::new(kind, external_id);

        let mut stmt = conn
            .prepare(
                "SELECT version FROM resource_entries
                 WHERE kind_key = ?1 AND external_key = ?2
                 ORDER BY version ASC",
            )
            .map_err(|e| internal_error(format!("Failed to prepare query: {}", e)))?;

        let versions = stmt
            .query_map(params![key.kind_key(), key.external_key()], |row| {
                row.get::<_, i64>(0)
            })
            .map_err(|e| internal_error(format!("Failed to list versions: {}", e)))?
            .map(|v| v.map(|v| v as u64))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| internal_error(format!("Failed to read version: {}", e)))?;

        Ok(versions)
    }

    async fn health_check(&self) -> StorageResult<()> {
        let conn = self.get_connection().map_err(|_| {
            StorageError::Backend(BackendError::Unavailable {
                backend_name: "sqlite".to_string(),
                message: "Failed to get connection".to_string(),
            })
        })?;
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .map_err(|e| internal_error(format!("Health check failed: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::sqlite::SqliteBackendConfig;
    use serde_json::json;

    fn create_test_backend() -> SqliteBackend {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.init_schema().unwrap();
        backend
    }

    #[tokio::test]
    async fn test_upsert_assigns_sequential_versions() {
        let backend = create_test_backend();

        let v1 = backend
            .upsert("Patient", "123", json!({"name": "John"}), None)
            .await
            .unwrap();
        let v2 = backend
            .upsert("Patient", "123", json!({"name": "Jane"}), None)
            .await
            .unwrap();

        assert_eq!(v1.version(), 1);
        assert_eq!(v2.version(), 2);
        assert_ne!(v1.id(), v2.id());
    }

    #[tokio::test]
    async fn test_read_ignores_case_and_wildcards() {
        let backend = create_test_backend();
        backend
            .upsert("Patient", "ABC", json!({"id": "ABC"}), None)
            .await
            .unwrap();

        let latest = backend.find_latest("patient", "abc%").await.unwrap().unwrap();
        assert_eq!(latest.external_id(), "ABC");
        assert!(backend.find_latest("patient", "%").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tombstone_for_unknown_key_is_not_found() {
        let backend = create_test_backend();
        let result = backend.delete("Patient", "missing").await;
        assert!(matches!(
            result,
            Err(StorageError::Resource(ResourceError::NotFound { .. }))
        ));
        assert!(backend.list_versions("Patient", "missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lock_strategy_matches_atomic_behavior() {
        let backend = SqliteBackend::with_config(
            ":memory:",
            SqliteBackendConfig {
                concurrency: ConcurrencyStrategy::AdvisoryLock,
                ..Default::default()
            },
        )
        .unwrap();
        backend.init_schema().unwrap();
        assert_eq!(backend.strategy(), ConcurrencyStrategy::AdvisoryLock);

        for expected in 1..=3 {
            let entry = backend
                .upsert("Observation", "o1", json!({"n": expected}), None)
                .await
                .unwrap();
            assert_eq!(entry.version(), expected);
        }
        backend.delete("Observation", "o1").await.unwrap();
        assert_eq!(
            backend.list_versions("Observation", "o1").await.unwrap(),
            vec![1, 2, 3, 4]
        );
    }

    #[tokio::test]
    async fn test_write_past_deadline_rolls_back() {
        let backend = SqliteBackend::with_config(
            ":memory:",
            SqliteBackendConfig {
                write_timeout_ms: 0,
                ..Default::default()
            },
        )
        .unwrap();
        backend.init_schema().unwrap();

        let result = backend
            .upsert("Patient", "slow", json!({"id": "slow"}), None)
            .await;
        assert!(matches!(
            result,
            Err(StorageError::Transaction(TransactionError::Timeout { timeout_ms: 0 }))
        ));
        assert!(backend.list_versions("Patient", "slow").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_health_check() {
        let backend = create_test_backend();
        backend.health_check().await.unwrap();
    }
}
