//! Tests for history reads: version lists, point reads and immutability.

use serde_json::json;

use register_persistence::core::{ConcurrencyStrategy, VersionedResourceRepository};

use crate::common::{create_backend, imaging_study_json, owner, patient_json};

#[tokio::test]
async fn test_list_versions_unknown_key() {
    let backend = create_backend(ConcurrencyStrategy::AtomicUpsert);
    assert!(backend.list_versions("Patient", "none").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_history_is_ascending_and_contiguous() {
    let backend = create_backend(ConcurrencyStrategy::AtomicUpsert);

    for n in 0..5 {
        backend
            .upsert("Patient", "p1", patient_json("p1", &format!("name-{n}")), None)
            .await
            .unwrap();
    }
    backend.delete("Patient", "p1").await.unwrap();

    assert_eq!(
        backend.list_versions("Patient", "p1").await.unwrap(),
        vec![1, 2, 3, 4, 5, 6]
    );
}

#[tokio::test]
async fn test_old_versions_are_unchanged_by_later_writes() {
    let backend = create_backend(ConcurrencyStrategy::AdvisoryLock);
    let alice = owner();

    let v1 = backend
        .upsert("ImagingStudy", "s1", imaging_study_json("s1", "first"), Some(&alice))
        .await
        .unwrap();
    backend
        .upsert("ImagingStudy", "s1", imaging_study_json("s1", "second"), None)
        .await
        .unwrap();
    backend.delete("ImagingStudy", "s1").await.unwrap();

    let reread = backend
        .find_version("ImagingStudy", "s1", 1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reread, v1);
}

#[tokio::test]
async fn test_each_version_reads_back_its_payload() {
    let backend = create_backend(ConcurrencyStrategy::AtomicUpsert);
    let payloads = [
        json!({"resourceType": "Observation", "id": "o1", "status": "preliminary"}),
        json!({"resourceType": "Observation", "id": "o1", "status": "final"}),
        json!({"resourceType": "Observation", "id": "o1", "status": "amended"}),
    ];

    for payload in &payloads {
        backend
            .upsert("Observation", "o1", payload.clone(), None)
            .await
            .unwrap();
    }

    for (index, payload) in payloads.iter().enumerate() {
        let entry = backend
            .find_version("Observation", "o1", index as u64 + 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.payload(), payload);
        assert_eq!(entry.versioned_url(), format!("Observation/o1/_history/{}", index + 1));
    }
}

#[tokio::test]
async fn test_latest_matches_highest_version() {
    let backend = create_backend(ConcurrencyStrategy::AtomicUpsert);

    for n in 0..3 {
        backend
            .upsert("Patient", "p1", patient_json("p1", &format!("n{n}")), None)
            .await
            .unwrap();
    }

    let versions = backend.list_versions("Patient", "p1").await.unwrap();
    let latest = backend.find_latest("Patient", "p1").await.unwrap().unwrap();
    assert_eq!(Some(&latest.version()), versions.last());

    let by_number = backend
        .find_version("Patient", "p1", latest.version())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_number, latest);
}
