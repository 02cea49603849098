//! Typed resource and datatype shapes.
//!
//! These are deliberately partial: they capture the elements the register
//! reasons about and ignore everything else in the payload. Unknown elements
//! never cause a parse failure; a known element with the wrong JSON shape does.

use serde::{Deserialize, Serialize};

use crate::serde_helpers::{PrimitiveOrElement, SingleOrVec};

// ============================================================================
// Datatypes
// ============================================================================

/// A reference from one resource to another.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    /// Returns the kind of resource this reference points at.
    ///
    /// An explicit `type` wins; otherwise the kind is taken from a relative
    /// literal reference such as `Practitioner/abc`.
    pub fn target_kind(&self) -> Option<&str> {
        if let Some(type_) = self.type_.as_deref().filter(|t| !t.is_empty()) {
            return Some(type_);
        }
        self.reference
            .as_deref()
            .and_then(|r| r.split_once('/'))
            .map(|(kind, _)| kind)
            .filter(|kind| !kind.is_empty())
    }

    /// Returns true when the reference identifies something.
    pub fn is_present(&self) -> bool {
        self.reference.as_deref().is_some_and(|r| !r.is_empty()) || self.identifier.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HumanName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// ============================================================================
// Resources
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub identifier: Vec<Identifier>,
    #[serde(default)]
    pub name: SingleOrVec<PrimitiveOrElement<HumanName>>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagingStudy {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub identifier: Vec<Identifier>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub subject: Option<Reference>,
    #[serde(default)]
    pub started: Option<String>,
    #[serde(default)]
    pub number_of_series: Option<u32>,
    #[serde(default)]
    pub number_of_instances: Option<u32>,
    #[serde(default)]
    pub series: Vec<ImagingStudySeries>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagingStudySeries {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub modality: Option<Coding>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub started: Option<String>,
    #[serde(default)]
    pub performer: Vec<ImagingStudyPerformer>,
}

impl ImagingStudySeries {
    /// Returns true if any performer's actor points at the given kind.
    pub fn has_performer_of_kind(&self, kind: &str) -> bool {
        self.performer.iter().any(|performer| {
            performer
                .actor
                .as_ref()
                .and_then(Reference::target_kind)
                .is_some_and(|target| target.eq_ignore_ascii_case(kind))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImagingStudyPerformer {
    #[serde(default)]
    pub function: Option<CodeableConcept>,
    #[serde(default)]
    pub actor: Option<Reference>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub code: Option<CodeableConcept>,
    #[serde(default)]
    pub subject: Option<Reference>,
    #[serde(default)]
    pub effective_date_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Practitioner {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub identifier: Vec<Identifier>,
    #[serde(default)]
    pub name: SingleOrVec<PrimitiveOrElement<HumanName>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Organization {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub identifier: Vec<Identifier>,
    #[serde(default)]
    pub name: Option<String>,
}
