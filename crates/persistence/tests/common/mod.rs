//! Shared fixtures for persistence integration tests.

#![allow(dead_code)]

use std::path::Path;

use serde_json::{Value, json};

use register_persistence::backends::sqlite::{SqliteBackend, SqliteBackendConfig};
use register_persistence::core::ConcurrencyStrategy;
use register_persistence::types::Pseudonym;

/// Both version allocation strategies, for tests that must hold under either.
pub const STRATEGIES: [ConcurrencyStrategy; 2] = [
    ConcurrencyStrategy::AtomicUpsert,
    ConcurrencyStrategy::AdvisoryLock,
];

/// In-memory backend with its schema initialized.
pub fn create_backend(strategy: ConcurrencyStrategy) -> SqliteBackend {
    let backend = SqliteBackend::with_config(
        ":memory:",
        SqliteBackendConfig {
            concurrency: strategy,
            ..Default::default()
        },
    )
    .expect("Failed to create SQLite backend");
    backend.init_schema().expect("Failed to initialize schema");
    backend
}

/// File-backed backend with a multi-connection pool, for concurrent writers.
pub fn create_file_backend(dir: &Path, strategy: ConcurrencyStrategy) -> SqliteBackend {
    let backend = SqliteBackend::with_config(
        dir.join("register.db"),
        SqliteBackendConfig {
            concurrency: strategy,
            max_connections: 8,
            busy_timeout_ms: 30_000,
            ..Default::default()
        },
    )
    .expect("Failed to create SQLite backend");
    backend.init_schema().expect("Failed to initialize schema");
    backend
}

pub fn patient_json(id: &str, family: &str) -> Value {
    json!({
        "resourceType": "Patient",
        "id": id,
        "name": [{"family": family}]
    })
}

pub fn imaging_study_json(id: &str, description: &str) -> Value {
    json!({
        "resourceType": "ImagingStudy",
        "id": id,
        "status": "available",
        "description": description
    })
}

pub fn owner() -> Pseudonym {
    Pseudonym::random()
}
