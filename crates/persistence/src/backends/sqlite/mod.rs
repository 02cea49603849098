//! SQLite backend implementation.
//!
//! Supports in-memory databases (great for testing) and file-based databases
//! in WAL mode. Both concurrency strategies run on SQLite: every write opens
//! a `BEGIN IMMEDIATE` transaction, which holds the database's single write
//! lock until commit.
//!
//! # Example
//!
//! ```no_run
//! use register_persistence::backends::sqlite::SqliteBackend;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Create an in-memory database
//! let backend = SqliteBackend::in_memory()?;
//!
//! // Initialize the schema
//! backend.init_schema()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! -- One row per version, append-only
//! CREATE TABLE resource_entries (
//!     seq INTEGER PRIMARY KEY AUTOINCREMENT,  -- insertion order
//!     id TEXT NOT NULL UNIQUE,                -- row UUID
//!     owner TEXT,                             -- pseudonym
//!     kind TEXT NOT NULL,
//!     external_id TEXT NOT NULL,
//!     kind_key TEXT NOT NULL,                 -- lower(kind)
//!     external_key TEXT NOT NULL,             -- lower(external_id)
//!     payload BLOB NOT NULL,                  -- JSON
//!     version INTEGER NOT NULL,
//!     created_at TEXT NOT NULL,
//!     deleted INTEGER NOT NULL DEFAULT 0,
//!     UNIQUE (kind_key, external_key, version)
//! );
//!
//! -- Highest committed version per key
//! CREATE TABLE resource_heads (
//!     kind_key TEXT NOT NULL,
//!     external_key TEXT NOT NULL,
//!     version INTEGER NOT NULL,
//!     PRIMARY KEY (kind_key, external_key)
//! );
//! ```

mod backend;
mod repository;
mod schema;

pub use backend::{SqliteBackend, SqliteBackendConfig};
pub use schema::SCHEMA_VERSION;
