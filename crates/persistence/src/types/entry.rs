//! The versioned row type.
//!
//! [`ResourceEntry`] is a plain data record: one immutable version of one
//! resource key. It carries no behavior for loading or saving itself; the
//! repository owns every read and write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::Pseudonym;

/// One immutable version of a resource.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use register_persistence::types::ResourceEntry;
/// use serde_json::json;
/// use uuid::Uuid;
///
/// let entry = ResourceEntry::from_storage(
///     Uuid::new_v4(),
///     None,
///     "Patient",
///     "123",
///     json!({"resourceType": "Patient", "id": "123"}),
///     1,
///     Utc::now(),
///     false,
/// );
///
/// assert_eq!(entry.url(), "Patient/123");
/// assert_eq!(entry.versioned_url(), "Patient/123/_history/1");
/// assert!(!entry.is_deleted());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntry {
    /// Row identifier, assigned when the row is created and never reused.
    id: Uuid,

    /// The pseudonym this resource is scoped to, if any.
    owner: Option<Pseudonym>,

    /// Resource kind discriminator, as written.
    kind: String,

    /// Caller-assigned id within the kind, as written.
    external_id: String,

    /// The stored document.
    payload: Value,

    /// Position in the key's version sequence, starting at 1.
    version: u64,

    /// When this version was written.
    created_at: DateTime<Utc>,

    /// Tombstone flag.
    deleted: bool,
}

impl ResourceEntry {
    /// Creates an entry from stored column values.
    #[allow(clippy::too_many_arguments)]
    pub fn from_storage(
        id: Uuid,
        owner: Option<Pseudonym>,
        kind: impl Into<String>,
        external_id: impl Into<String>,
        payload: Value,
        version: u64,
        created_at: DateTime<Utc>,
        deleted: bool,
    ) -> Self {
        Self {
            id,
            owner,
            kind: kind.into(),
            external_id: external_id.into(),
            payload,
            version,
            created_at,
            deleted,
        }
    }

    /// Returns the row identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the owning pseudonym, if any.
    pub fn owner(&self) -> Option<&Pseudonym> {
        self.owner.as_ref()
    }

    /// Returns the resource kind as written.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the external id as written.
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    /// Returns the stored document.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Consumes self and returns the stored document.
    pub fn into_payload(self) -> Value {
        self.payload
    }

    /// Returns the version number.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns when this version was written.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` if this version is a tombstone.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Returns the resource path (e.g., "Patient/123").
    pub fn url(&self) -> String {
        format!("{}/{}", self.kind, self.external_id)
    }

    /// Returns the versioned path (e.g., "Patient/123/_history/1").
    pub fn versioned_url(&self) -> String {
        format!("{}/{}/_history/{}", self.kind, self.external_id, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(version: u64, deleted: bool) -> ResourceEntry {
        ResourceEntry::from_storage(
            Uuid::new_v4(),
            Some(Pseudonym::random()),
            "ImagingStudy",
            "study-1",
            json!({"resourceType": "ImagingStudy", "id": "study-1"}),
            version,
            Utc::now(),
            deleted,
        )
    }

    #[test]
    fn test_accessors() {
        let e = entry(3, false);
        assert_eq!(e.kind(), "ImagingStudy");
        assert_eq!(e.external_id(), "study-1");
        assert_eq!(e.version(), 3);
        assert!(e.owner().is_some());
        assert_eq!(e.versioned_url(), "ImagingStudy/study-1/_history/3");
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(entry(1, true)).unwrap();
        assert_eq!(json["externalId"], "study-1");
        assert_eq!(json["deleted"], true);
        assert!(json.get("createdAt").is_some());
    }
}
