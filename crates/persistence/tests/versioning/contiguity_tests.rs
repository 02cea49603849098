//! Tests for version allocation under concurrent writers.
//!
//! Every test runs against a file-backed database with a multi-connection
//! pool so that writers really contend for the same key.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;

use register_persistence::core::{ConcurrencyStrategy, VersionedResourceRepository};

use crate::common::{STRATEGIES, create_file_backend, owner};

const WRITERS: u64 = 24;

async fn concurrent_upserts(
    backend: Arc<dyn VersionedResourceRepository>,
    kind: &'static str,
    id: &'static str,
    writers: u64,
) -> Vec<u64> {
    let mut handles = Vec::new();
    for n in 0..writers {
        let backend = Arc::clone(&backend);
        handles.push(tokio::spawn(async move {
            backend
                .upsert(kind, id, json!({"resourceType": kind, "id": id, "writer": n}), None)
                .await
                .map(|entry| entry.version())
        }));
    }

    let mut versions = Vec::new();
    for handle in handles {
        versions.push(handle.await.unwrap().unwrap());
    }
    versions.sort_unstable();
    versions
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_get_distinct_contiguous_versions() {
    for strategy in STRATEGIES {
        let dir = tempfile::tempdir().unwrap();
        let backend: Arc<dyn VersionedResourceRepository> =
            Arc::new(create_file_backend(dir.path(), strategy));

        let versions = concurrent_upserts(Arc::clone(&backend), "Patient", "hot", WRITERS).await;

        let expected: Vec<u64> = (1..=WRITERS).collect();
        assert_eq!(versions, expected, "strategy {strategy}");
        assert_eq!(
            backend.list_versions("Patient", "hot").await.unwrap(),
            expected,
            "strategy {strategy}"
        );

        let latest = backend.find_latest("Patient", "hot").await.unwrap().unwrap();
        assert_eq!(latest.version(), WRITERS);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_on_separate_keys() {
    let dir = tempfile::tempdir().unwrap();
    let backend: Arc<dyn VersionedResourceRepository> = Arc::new(create_file_backend(
        dir.path(),
        ConcurrencyStrategy::AtomicUpsert,
    ));

    let (a, b) = tokio::join!(
        concurrent_upserts(Arc::clone(&backend), "Observation", "a", 10),
        concurrent_upserts(Arc::clone(&backend), "Observation", "b", 10),
    );

    let expected: Vec<u64> = (1..=10).collect();
    assert_eq!(a, expected);
    assert_eq!(b, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deletes_append_one_tombstone() {
    for strategy in STRATEGIES {
        let dir = tempfile::tempdir().unwrap();
        let backend: Arc<dyn VersionedResourceRepository> =
            Arc::new(create_file_backend(dir.path(), strategy));

        backend
            .upsert("ImagingStudy", "s1", json!({"resourceType": "ImagingStudy", "id": "s1"}), Some(&owner()))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let backend = Arc::clone(&backend);
            handles.push(tokio::spawn(async move {
                backend.delete("ImagingStudy", "s1").await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(
            backend.list_versions("ImagingStudy", "s1").await.unwrap(),
            vec![1, 2],
            "strategy {strategy}"
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_row_ids_are_unique() {
    let dir = tempfile::tempdir().unwrap();
    let backend: Arc<dyn VersionedResourceRepository> = Arc::new(create_file_backend(
        dir.path(),
        ConcurrencyStrategy::AdvisoryLock,
    ));

    concurrent_upserts(Arc::clone(&backend), "Patient", "p", 12).await;

    let mut ids = HashSet::new();
    for version in 1..=12 {
        let entry = backend.find_version("Patient", "p", version).await.unwrap().unwrap();
        assert!(ids.insert(entry.id()));
    }
}
