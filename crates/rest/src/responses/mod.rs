//! Response formatting for the register's HTTP API.
//!
//! - [`bundle`] - Searchset Bundle building
//! - [`format`] - Resource body rendering
//! - [`headers`] - Response header generation (ETag, Last-Modified, Location)

pub mod bundle;
pub mod format;
pub mod headers;

pub use bundle::BundleBuilder;
pub use format::format_resource_response;
pub use headers::{FHIR_JSON, ResourceHeaders, parse_if_match};
