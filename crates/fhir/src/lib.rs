//! Typed resource shapes for the metadata register.
//!
//! The register stores payloads as opaque JSON documents. This crate gives a
//! small, strongly-typed view over the resource kinds the register knows how
//! to validate in depth, and a converter that maps an untyped payload onto
//! that view.
//!
//! Only an explicit allow-list of kinds is ever parsed:
//!
//! | Kind | Type |
//! |------|------|
//! | `Patient` | [`Patient`] |
//! | `ImagingStudy` | [`ImagingStudy`] |
//! | `Observation` | [`Observation`] |
//! | `Practitioner` | [`Practitioner`] |
//! | `Organization` | [`Organization`] |
//!
//! # Example
//!
//! ```
//! use register_fhir::{to_typed, TypedResource};
//! use serde_json::json;
//!
//! let payload = json!({
//!     "resourceType": "Patient",
//!     "id": "123",
//!     "name": [{"family": "Smith", "given": ["John"]}]
//! });
//!
//! match to_typed(&payload) {
//!     Some(TypedResource::Patient(patient)) => {
//!         assert_eq!(patient.id.as_deref(), Some("123"));
//!     }
//!     _ => panic!("expected a patient"),
//! }
//! ```

pub mod convert;
pub mod kind;
pub mod model;
pub mod serde_helpers;

pub use convert::{to_typed, TypedResource};
pub use kind::ResourceKind;
pub use model::{
    CodeableConcept, Coding, HumanName, Identifier, ImagingStudy, ImagingStudyPerformer,
    ImagingStudySeries, Observation, Organization, Patient, Practitioner, Reference,
};
