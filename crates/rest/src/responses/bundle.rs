//! Bundle response building.

use serde_json::{Value, json};
use uuid::Uuid;

/// Builder for searchset Bundle resources.
///
/// Each entry carries only the stored payload, in the order given.
#[derive(Debug, Default)]
pub struct BundleBuilder {
    entries: Vec<Value>,
}

impl BundleBuilder {
    /// Creates a searchset bundle builder.
    pub fn searchset() -> Self {
        Self::default()
    }

    /// Adds a resource as an entry.
    pub fn add_resource(mut self, resource: Value) -> Self {
        self.entries.push(resource);
        self
    }

    /// Builds the Bundle resource with a fresh id.
    pub fn build(self) -> Value {
        let total = self.entries.len();
        let entries: Vec<Value> = self
            .entries
            .into_iter()
            .map(|resource| json!({ "resource": resource }))
            .collect();

        json!({
            "resourceType": "Bundle",
            "id": Uuid::new_v4().to_string(),
            "type": "searchset",
            "total": total,
            "entry": entries
        })
    }
}
