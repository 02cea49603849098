//! Conversion of untyped payloads into typed resources.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use crate::kind::ResourceKind;
use crate::model::{ImagingStudy, Observation, Organization, Patient, Practitioner};

/// A payload parsed into one of the allow-listed resource shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedResource {
    Patient(Box<Patient>),
    ImagingStudy(Box<ImagingStudy>),
    Observation(Box<Observation>),
    Practitioner(Box<Practitioner>),
    Organization(Box<Organization>),
}

impl TypedResource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            TypedResource::Patient(_) => ResourceKind::Patient,
            TypedResource::ImagingStudy(_) => ResourceKind::ImagingStudy,
            TypedResource::Observation(_) => ResourceKind::Observation,
            TypedResource::Practitioner(_) => ResourceKind::Practitioner,
            TypedResource::Organization(_) => ResourceKind::Organization,
        }
    }
}

/// Maps an untyped payload to its typed form.
///
/// The kind is read from the payload's own `resourceType`. Returns `None`
/// without attempting a parse when that kind is missing or not allow-listed.
/// A parse failure for an allow-listed kind is logged and also yields `None`;
/// callers fall back to structural checks only.
pub fn to_typed(payload: &Value) -> Option<TypedResource> {
    let declared = payload.get("resourceType").and_then(Value::as_str)?;
    let Some(kind) = ResourceKind::parse(declared) else {
        debug!(resource_type = declared, "No typed shape for resource kind");
        return None;
    };

    match kind {
        ResourceKind::Patient => parse(kind, payload).map(TypedResource::Patient),
        ResourceKind::ImagingStudy => parse(kind, payload).map(TypedResource::ImagingStudy),
        ResourceKind::Observation => parse(kind, payload).map(TypedResource::Observation),
        ResourceKind::Practitioner => parse(kind, payload).map(TypedResource::Practitioner),
        ResourceKind::Organization => parse(kind, payload).map(TypedResource::Organization),
    }
}

fn parse<T: DeserializeOwned>(kind: ResourceKind, payload: &Value) -> Option<Box<T>> {
    match T::deserialize(payload) {
        Ok(resource) => Some(Box::new(resource)),
        Err(e) => {
            error!(resource_type = %kind, error = %e, "Failed to parse resource payload");
            None
        }
    }
}
