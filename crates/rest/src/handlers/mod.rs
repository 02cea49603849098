//! HTTP request handlers for register interactions.
//!
//! - [`read`] - Read the latest version of a resource
//! - [`vread`] - Read a specific version of a resource
//! - [`update`] - Create or update a resource
//! - [`delete`] - Delete a resource
//! - [`patch`] - Rejected; the register does not patch
//! - [`search`] - Find all resources of a kind for a pseudonym
//! - [`health`] - Health check endpoint
//! - [`index`] - Service banner

pub mod delete;
pub mod health;
pub mod index;
pub mod patch;
pub mod read;
pub mod search;
pub mod update;
pub mod vread;

pub use delete::delete_handler;
pub use health::health_handler;
pub use index::{index_handler, not_found_handler};
pub use patch::patch_handler;
pub use read::read_handler;
pub use search::search_handler;
pub use update::update_handler;
pub use vread::vread_handler;
