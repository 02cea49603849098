//! Core types for the persistence layer.
//!
//! - [`ResourceEntry`] - One immutable version of a resource
//! - [`ResourceKey`] - The sanitized, case-insensitive `(kind, external id)` pair
//! - [`Pseudonym`] - The owner a resource is scoped to

mod entry;
mod key;
mod pseudonym;

pub use entry::ResourceEntry;
pub use key::{fold_case, sanitize, same_key, ResourceKey};
pub use pseudonym::Pseudonym;
