//! MetadataService integration tests.
//!
//! These run the full convert, validate and store path against SQLite.

#![cfg(feature = "sqlite")]

use std::sync::Arc;

use serde_json::{Value, json};

use register_metadata::{LATEST_VERSION, MetadataService};
use register_persistence::backends::sqlite::{SqliteBackend, SqliteBackendConfig};
use register_persistence::core::{ConcurrencyStrategy, VersionedResourceRepository};
use register_persistence::error::{
    ConcurrencyError, ResourceError, StorageError, ValidationError,
};
use register_persistence::types::Pseudonym;

fn create_service() -> MetadataService {
    let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
    backend.init_schema().expect("Failed to initialize schema");
    let repository: Arc<dyn VersionedResourceRepository> = Arc::new(backend);
    MetadataService::new(repository)
}

fn patient(id: &str, name: &str) -> Value {
    json!({"resourceType": "Patient", "id": id, "name": name})
}

fn imaging_study(id: &str, performers: Value) -> Value {
    json!({
        "resourceType": "ImagingStudy",
        "id": id,
        "status": "available",
        "subject": {"reference": "Patient/123", "type": "Patient"},
        "started": "2024-05-02T08:30:00Z",
        "series": [{
            "uid": "1.2.840.1",
            "started": "2024-05-02T08:31:00Z",
            "performer": performers
        }]
    })
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_sequential_updates_keep_history() {
    let service = create_service();
    let owner = Pseudonym::random();

    let v1 = service
        .update("patient", "123", patient("123", "John"), Some(&owner), None)
        .await
        .unwrap();
    assert_eq!(v1.version(), 1);

    let v2 = service
        .update("patient", "123", patient("123", "Jane"), Some(&owner), None)
        .await
        .unwrap();
    assert_eq!(v2.version(), 2);

    let original = service.search_by_version("patient", "123", 1).await.unwrap();
    assert_eq!(original.payload()["name"], "John");
}

#[tokio::test]
async fn test_kind_mismatch_is_invalid_resource() {
    let service = create_service();

    let result = service
        .update(
            "patient",
            "123",
            json!({"resourceType": "ImagingStudy", "id": "123"}),
            None,
            None,
        )
        .await;

    match result {
        Err(StorageError::Validation(ValidationError::InvalidResource { reason })) => {
            assert_eq!(reason, "resource type does not match the resource type in the URL");
        }
        other => panic!("expected InvalidResource, got {other:?}"),
    }
}

#[tokio::test]
async fn test_imaging_study_performer_roles() {
    let service = create_service();

    let missing_practitioner = imaging_study(
        "study-1",
        json!([{"actor": {"reference": "Organization/org-1"}}]),
    );
    let result = service
        .update("ImagingStudy", "study-1", missing_practitioner, None, None)
        .await;
    match result {
        Err(StorageError::Validation(ValidationError::Rejected { reason })) => {
            assert!(reason.contains("Practitioner"), "{reason}");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }

    let complete = imaging_study(
        "study-1",
        json!([
            {"actor": {"reference": "Organization/org-1"}},
            {"actor": {"reference": "Practitioner/prac-1"}}
        ]),
    );
    let entry = service
        .update("ImagingStudy", "study-1", complete, None, None)
        .await
        .unwrap();
    assert_eq!(entry.version(), 1);
}

#[tokio::test]
async fn test_delete_unknown_key_is_not_found() {
    let service = create_service();
    let result = service.delete("patient", "999").await;
    assert!(matches!(
        result,
        Err(StorageError::Resource(ResourceError::NotFound { .. }))
    ));
}

// ============================================================================
// Properties
// ============================================================================

#[tokio::test]
async fn test_failed_validation_leaves_key_unchanged() {
    let service = create_service();
    service
        .update("Patient", "p1", patient("p1", "First"), None, None)
        .await
        .unwrap();

    let before = service.list_versions("Patient", "p1").await.unwrap();
    let result = service
        .update("Patient", "p1", json!({"resourceType": "Patient", "id": "p2"}), None, None)
        .await;
    assert!(result.is_err());

    assert_eq!(service.list_versions("Patient", "p1").await.unwrap(), before);
    let next = service
        .update("Patient", "p1", patient("p1", "Second"), None, None)
        .await
        .unwrap();
    assert_eq!(next.version(), 2);
}

#[tokio::test]
async fn test_latest_equals_highest_version() {
    let service = create_service();
    for name in ["a", "b", "c"] {
        service
            .update("Patient", "p1", patient("p1", name), None, None)
            .await
            .unwrap();
    }

    let highest = *service.list_versions("Patient", "p1").await.unwrap().last().unwrap();
    let latest = service.search_by_version("Patient", "p1", LATEST_VERSION).await.unwrap();
    let explicit = service.search_by_version("Patient", "p1", highest).await.unwrap();
    assert_eq!(latest, explicit);
}

#[tokio::test]
async fn test_history_survives_delete() {
    let service = create_service();
    let v1 = service
        .update("Patient", "p1", patient("p1", "One"), None, None)
        .await
        .unwrap();
    service
        .update("Patient", "p1", patient("p1", "Two"), None, None)
        .await
        .unwrap();
    service.delete("Patient", "p1").await.unwrap();

    let reread = service.search_by_version("Patient", "p1", 1).await.unwrap();
    assert_eq!(reread.payload(), v1.payload());
    assert!(!reread.is_deleted());

    let latest = service.search_by_version("Patient", "p1", LATEST_VERSION).await.unwrap();
    assert!(latest.is_deleted());
    assert!(service.search_by_version("Patient", "p1", 2).await.is_ok());
}

#[tokio::test]
async fn test_round_trip_payload() {
    let service = create_service();
    let owner = Pseudonym::random();
    let payload = json!({
        "resourceType": "Observation",
        "id": "obs-1",
        "status": "final",
        "code": {"coding": [{"system": "http://loinc.org", "code": "8867-4"}]},
        "valueQuantity": {"value": 72.5, "unit": "beats/minute"}
    });

    let entry = service
        .update("Observation", "obs-1", payload.clone(), Some(&owner), None)
        .await
        .unwrap();
    let fetched = service
        .search_by_version("Observation", "obs-1", entry.version())
        .await
        .unwrap();

    assert_eq!(fetched.payload(), &payload);
    assert_eq!(fetched.owner(), Some(&owner));
}

#[tokio::test]
async fn test_search_by_owner() {
    let service = create_service();
    let owner = Pseudonym::random();
    let performers = json!([
        {"actor": {"reference": "Organization/org-1"}},
        {"actor": {"reference": "Practitioner/prac-1"}}
    ]);

    service
        .update("ImagingStudy", "s1", imaging_study("s1", performers.clone()), Some(&owner), None)
        .await
        .unwrap();
    service
        .update("ImagingStudy", "s2", imaging_study("s2", performers), Some(&owner), None)
        .await
        .unwrap();
    service.delete("ImagingStudy", "s2").await.unwrap();

    let found = service.search_by_owner(&owner, "ImagingStudy").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].external_id(), "s1");
}

#[tokio::test]
async fn test_expected_version_mismatch() {
    let service = create_service();
    service
        .update("Patient", "p1", patient("p1", "One"), None, None)
        .await
        .unwrap();
    service
        .update("Patient", "p1", patient("p1", "Two"), None, Some(1))
        .await
        .unwrap();

    let result = service
        .update("Patient", "p1", patient("p1", "Three"), None, Some(1))
        .await;
    assert!(matches!(
        result,
        Err(StorageError::Concurrency(ConcurrencyError::PreconditionFailed {
            expected_version: 1,
            actual_version: 2,
            ..
        }))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_through_service() {
    let dir = tempfile::tempdir().unwrap();
    let backend = SqliteBackend::with_config(
        dir.path().join("register.db"),
        SqliteBackendConfig {
            concurrency: ConcurrencyStrategy::AdvisoryLock,
            max_connections: 6,
            busy_timeout_ms: 30_000,
            ..Default::default()
        },
    )
    .unwrap();
    backend.init_schema().unwrap();
    let service = MetadataService::new(Arc::new(backend));

    let mut handles = Vec::new();
    for n in 0..16 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .update("Patient", "shared", patient("shared", &format!("w{n}")), None, None)
                .await
                .map(|entry| entry.version())
        }));
    }

    let mut versions = Vec::new();
    for handle in handles {
        versions.push(handle.await.unwrap().unwrap());
    }
    versions.sort_unstable();
    assert_eq!(versions, (1..=16).collect::<Vec<u64>>());
}
