//! Route configuration for the register's HTTP API.

pub mod resource_routes;

pub use resource_routes::create_routes;
