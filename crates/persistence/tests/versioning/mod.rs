//! Versioning and history tests for persistence backends.
//!
//! This module contains tests for version allocation under contention,
//! optimistic locking, and history operations.

pub mod contiguity_tests;
pub mod history_tests;
pub mod optimistic_locking_tests;
