//! Write-time validation of resource payloads.
//!
//! Every payload passes two ordered phases before it may be stored:
//!
//! 1. **Structural** checks that apply to every kind: the payload declares
//!    its own `resourceType` and `id`, and both match the addressed key
//!    case-insensitively.
//! 2. **Domain** checks picked by [`Validator::for_kind`], run against the
//!    typed form produced by [`register_fhir::to_typed`]. When the payload
//!    has no typed form the domain phase is skipped.

use register_fhir::{ImagingStudy, TypedResource, to_typed};
use register_persistence::error::ValidationError;
use register_persistence::types::{fold_case, same_key};
use serde_json::Value;

/// Performer roles every imaging series must reference.
const REQUIRED_SERIES_PERFORMERS: [&str; 2] = ["Organization", "Practitioner"];

/// Runs the structural and domain validation phases for a write.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationPipeline;

impl ValidationPipeline {
    /// Creates a new validation pipeline.
    pub fn new() -> Self {
        Self
    }

    /// Validates a payload addressed to `kind/external_id`.
    ///
    /// # Errors
    ///
    /// * `ValidationError::InvalidResource` - If the declared kind differs from `kind`
    /// * `ValidationError::Rejected` - If a field is missing, the id differs,
    ///   or a domain rule fails
    pub fn validate(
        &self,
        kind: &str,
        external_id: &str,
        payload: &Value,
    ) -> Result<(), ValidationError> {
        validate_structure(kind, external_id, payload)?;

        let Some(resource) = to_typed(payload) else {
            return Ok(());
        };

        Validator::for_kind(kind).validate(&resource)
    }
}

/// Checks the fields every payload must carry.
fn validate_structure(
    kind: &str,
    external_id: &str,
    payload: &Value,
) -> Result<(), ValidationError> {
    let Some(object) = payload.as_object() else {
        return Err(ValidationError::rejected("resource data must be a JSON object"));
    };

    let declared_kind = object
        .get("resourceType")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::rejected("resourceType is required in the resource data"))?;
    if !same_key(declared_kind, kind) {
        return Err(ValidationError::invalid_resource(
            "resource type does not match the resource type in the URL",
        ));
    }

    let declared_id = object
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::rejected("id is required in the resource data"))?;
    if !same_key(declared_id, external_id) {
        return Err(ValidationError::rejected(
            "id in the resource data does not match the resource id in the URL",
        ));
    }

    Ok(())
}

/// Kind-specific business rules.
///
/// The mapping from kind name to variant is total: kinds without rules of
/// their own resolve to [`Validator::NoOp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    ImagingStudy,
    Patient,
    Medication,
    NoOp,
}

impl Validator {
    /// Picks the validator for a kind name, ignoring case.
    pub fn for_kind(kind: &str) -> Self {
        match fold_case(kind).as_str() {
            "imagingstudy" => Validator::ImagingStudy,
            "patient" => Validator::Patient,
            "medication" => Validator::Medication,
            _ => Validator::NoOp,
        }
    }

    /// Applies this validator's rules to a typed resource.
    pub fn validate(&self, resource: &TypedResource) -> Result<(), ValidationError> {
        match self {
            Validator::ImagingStudy => match resource {
                TypedResource::ImagingStudy(study) => validate_imaging_study(study),
                _ => Err(ValidationError::rejected("Resource is not an ImagingStudy")),
            },
            // No rules beyond the structural phase yet.
            Validator::Patient | Validator::Medication | Validator::NoOp => Ok(()),
        }
    }
}

fn validate_imaging_study(study: &ImagingStudy) -> Result<(), ValidationError> {
    let subject = study
        .subject
        .as_ref()
        .filter(|subject| subject.is_present() || subject.type_.is_some())
        .ok_or_else(|| ValidationError::rejected("Subject resource must be present"))?;

    if let Some(target) = subject.target_kind() {
        if !target.eq_ignore_ascii_case("Patient") {
            return Err(ValidationError::rejected("Subject resource type is not Patient"));
        }
    }

    if is_blank(study.started.as_deref()) {
        return Err(ValidationError::rejected("ImagingStudy must declare a started timestamp"));
    }

    for (index, series) in study.series.iter().enumerate() {
        if is_blank(series.started.as_deref()) {
            return Err(ValidationError::rejected(format!(
                "series[{index}] must declare a started timestamp"
            )));
        }

        for role in REQUIRED_SERIES_PERFORMERS {
            if !series.has_performer_of_kind(role) {
                return Err(ValidationError::rejected(format!(
                    "series[{index}] is missing a performer referencing a {role}"
                )));
            }
        }
    }

    Ok(())
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
