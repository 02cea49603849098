//! PostgreSQL schema definitions and migrations.

use crate::error::{BackendError, StorageError, StorageResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

fn pg_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::MigrationError { message })
}

/// Initialize the database schema.
pub async fn initialize_schema(client: &deadpool_postgres::Client) -> StorageResult<()> {
    let current_version = get_schema_version(client).await?;

    if current_version == 0 {
        create_schema_v1(client).await?;
        set_schema_version(client, SCHEMA_VERSION).await?;
        tracing::info!(version = SCHEMA_VERSION, "Created PostgreSQL schema");
    } else if current_version > SCHEMA_VERSION {
        return Err(pg_error(format!(
            "database schema version {} is newer than supported version {}",
            current_version, SCHEMA_VERSION
        )));
    }

    Ok(())
}

/// Get the current schema version.
async fn get_schema_version(client: &deadpool_postgres::Client) -> StorageResult<i32> {
    client
        .execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER NOT NULL
            )",
            &[],
        )
        .await
        .map_err(|e| pg_error(format!("Failed to create schema_version table: {}", e)))?;

    let row = client
        .query_opt("SELECT version FROM schema_version LIMIT 1", &[])
        .await
        .map_err(|e| pg_error(format!("Failed to query schema version: {}", e)))?;

    match row {
        Some(r) => r
            .try_get::<_, i32>(0)
            .map_err(|e| pg_error(format!("Failed to read schema version: {}", e))),
        None => Ok(0),
    }
}

/// Set the schema version.
async fn set_schema_version(client: &deadpool_postgres::Client, version: i32) -> StorageResult<()> {
    client
        .execute("DELETE FROM schema_version", &[])
        .await
        .map_err(|e| pg_error(format!("Failed to clear schema_version: {}", e)))?;

    client
        .execute(
            "INSERT INTO schema_version (version) VALUES ($1)",
            &[&version],
        )
        .await
        .map_err(|e| pg_error(format!("Failed to set schema_version: {}", e)))?;

    Ok(())
}

/// Create the initial schema (version 1).
async fn create_schema_v1(client: &deadpool_postgres::Client) -> StorageResult<()> {
    client
        .execute(
            "CREATE TABLE IF NOT EXISTS resource_entries (
                seq BIGSERIAL PRIMARY KEY,
                id UUID NOT NULL UNIQUE,
                owner TEXT,
                kind TEXT NOT NULL,
                external_id TEXT NOT NULL,
                kind_key TEXT NOT NULL,
                external_key TEXT NOT NULL,
                payload JSONB NOT NULL,
                version BIGINT NOT NULL CHECK (version > 0),
                created_at TIMESTAMPTZ NOT NULL,
                deleted BOOLEAN NOT NULL DEFAULT FALSE,
                UNIQUE (kind_key, external_key, version)
            )",
            &[],
        )
        .await
        .map_err(|e| pg_error(format!("Failed to create resource_entries table: {}", e)))?;

    client
        .execute(
            "CREATE INDEX IF NOT EXISTS idx_resource_entries_owner
             ON resource_entries (owner, kind_key)",
            &[],
        )
        .await
        .map_err(|e| pg_error(format!("Failed to create owner index: {}", e)))?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS resource_heads (
                kind_key TEXT NOT NULL,
                external_key TEXT NOT NULL,
                version BIGINT NOT NULL,
                PRIMARY KEY (kind_key, external_key)
            )",
            &[],
        )
        .await
        .map_err(|e| pg_error(format!("Failed to create resource_heads table: {}", e)))?;

    Ok(())
}
