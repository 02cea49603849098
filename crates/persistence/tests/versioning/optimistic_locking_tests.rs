//! Tests for compare-and-swap writes.
//!
//! `upsert_with_match` only appends when the caller's expected version is
//! still the latest one.

use std::sync::Arc;

use register_persistence::core::{ConcurrencyStrategy, VersionedResourceRepository};
use register_persistence::error::{ConcurrencyError, StorageError};

use crate::common::{STRATEGIES, create_backend, create_file_backend, patient_json};

// ============================================================================
// Optimistic Locking Tests - Basic
// ============================================================================

/// A matching expected version appends the next one.
#[tokio::test]
async fn test_upsert_with_match_success() {
    for strategy in STRATEGIES {
        let backend = create_backend(strategy);

        let v1 = backend
            .upsert("Patient", "p1", patient_json("p1", "Smith"), None)
            .await
            .unwrap();

        let v2 = backend
            .upsert_with_match("Patient", "p1", patient_json("p1", "Jones"), None, Some(v1.version()))
            .await
            .unwrap();

        assert_eq!(v2.version(), 2, "strategy {strategy}");
        assert_eq!(v2.payload()["name"][0]["family"], "Jones");
    }
}

/// A stale expected version is rejected and nothing is written.
#[tokio::test]
async fn test_upsert_with_match_stale_version() {
    for strategy in STRATEGIES {
        let backend = create_backend(strategy);

        backend
            .upsert("Patient", "p1", patient_json("p1", "Smith"), None)
            .await
            .unwrap();
        backend
            .upsert("Patient", "p1", patient_json("p1", "Jones"), None)
            .await
            .unwrap();

        let result = backend
            .upsert_with_match("Patient", "p1", patient_json("p1", "Late"), None, Some(1))
            .await;

        match result {
            Err(StorageError::Concurrency(ConcurrencyError::PreconditionFailed {
                expected_version,
                actual_version,
                ..
            })) => {
                assert_eq!(expected_version, 1);
                assert_eq!(actual_version, 2);
            }
            other => panic!("expected PreconditionFailed, got {other:?}"),
        }

        // The rejected write left no trace, and the next write still gets 3
        assert_eq!(backend.list_versions("Patient", "p1").await.unwrap(), vec![1, 2]);
        let v3 = backend
            .upsert("Patient", "p1", patient_json("p1", "Next"), None)
            .await
            .unwrap();
        assert_eq!(v3.version(), 3, "strategy {strategy}");
    }
}

/// An expected version on a key with no rows is ignored.
#[tokio::test]
async fn test_upsert_with_match_on_new_key() {
    let backend = create_backend(ConcurrencyStrategy::AtomicUpsert);

    let entry = backend
        .upsert_with_match("Patient", "fresh", patient_json("fresh", "New"), None, Some(7))
        .await
        .unwrap();

    assert_eq!(entry.version(), 1);
}

/// An expected version ahead of the latest one is also a mismatch.
#[tokio::test]
async fn test_upsert_with_match_future_version() {
    let backend = create_backend(ConcurrencyStrategy::AdvisoryLock);
    backend
        .upsert("Patient", "p1", patient_json("p1", "Smith"), None)
        .await
        .unwrap();

    let result = backend
        .upsert_with_match("Patient", "p1", patient_json("p1", "Jones"), None, Some(5))
        .await;
    assert!(matches!(
        result,
        Err(StorageError::Concurrency(ConcurrencyError::PreconditionFailed { .. }))
    ));
}

/// A tombstone counts as the latest version for the precondition.
#[tokio::test]
async fn test_upsert_with_match_after_delete() {
    let backend = create_backend(ConcurrencyStrategy::AtomicUpsert);
    backend
        .upsert("Patient", "p1", patient_json("p1", "Smith"), None)
        .await
        .unwrap();
    backend.delete("Patient", "p1").await.unwrap();

    let stale = backend
        .upsert_with_match("Patient", "p1", patient_json("p1", "Jones"), None, Some(1))
        .await;
    assert!(stale.is_err());

    let revived = backend
        .upsert_with_match("Patient", "p1", patient_json("p1", "Jones"), None, Some(2))
        .await
        .unwrap();
    assert_eq!(revived.version(), 3);
}

// ============================================================================
// Optimistic Locking Tests - Concurrent
// ============================================================================

/// Of several writers holding the same expected version, exactly one wins.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_matches_single_winner() {
    for strategy in STRATEGIES {
        let dir = tempfile::tempdir().unwrap();
        let backend: Arc<dyn VersionedResourceRepository> =
            Arc::new(create_file_backend(dir.path(), strategy));

        backend
            .upsert("Patient", "p1", patient_json("p1", "Smith"), None)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for n in 0..8 {
            let backend = Arc::clone(&backend);
            handles.push(tokio::spawn(async move {
                backend
                    .upsert_with_match(
                        "Patient",
                        "p1",
                        patient_json("p1", &format!("writer-{n}")),
                        None,
                        Some(1),
                    )
                    .await
            }));
        }

        let mut winners = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(entry) => {
                    assert_eq!(entry.version(), 2);
                    winners += 1;
                }
                Err(StorageError::Concurrency(ConcurrencyError::PreconditionFailed { .. })) => {
                    conflicts += 1
                }
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(winners, 1, "strategy {strategy}");
        assert_eq!(conflicts, 7, "strategy {strategy}");
        assert_eq!(backend.list_versions("Patient", "p1").await.unwrap(), vec![1, 2]);
    }
}
