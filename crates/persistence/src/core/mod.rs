//! Core storage traits and abstractions.
//!
//! - [`VersionedResourceRepository`] - Append-only versioned CRUD
//! - [`ConcurrencyStrategy`] - How version numbers are allocated under contention
//! - [`RepositoryConfig`], [`EngineKind`] - Engine selection from configuration

mod backend;
mod repository;
mod strategy;

pub(crate) use backend::sqlite_path;
pub use backend::{EngineKind, RepositoryConfig};
pub use repository::VersionedResourceRepository;
pub(crate) use strategy::check_precondition;
pub use strategy::ConcurrencyStrategy;
