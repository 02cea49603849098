//! Axum extractors for register requests.
//!
//! - [`OwnerParam`] - Extract and validate the `pseudonym` query parameter
//! - [`Pretty`] - Extract the `_pretty` query flag
//! - [`IfMatch`] - Extract the expected version from `If-Match`

mod if_match;
mod owner;
mod pretty;

pub use if_match::IfMatch;
pub use owner::OwnerParam;
pub use pretty::Pretty;
