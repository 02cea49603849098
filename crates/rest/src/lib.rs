//! # register-rest - HTTP API for the metadata register
//!
//! This crate exposes a [`MetadataService`](register_metadata::MetadataService)
//! over HTTP with axum. It owns everything the service layer leaves to its
//! caller: mapping storage errors onto status codes, exchanging pseudonyms
//! before they reach storage, and notifying the referral index after owned
//! writes.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use register_persistence::backends::open_repository;
//! use register_rest::{ServerConfig, create_app_with_config, init_logging};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::default();
//!     init_logging(&config.log_level);
//!
//!     let repository = open_repository(&config.repository_config()).await?;
//!     let app = create_app_with_config(repository, config.clone());
//!
//!     let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Interaction | HTTP Method | URL Pattern |
//! |------------|-------------|-------------|
//! | read | GET | `/resource/[kind]/[id]` |
//! | vread | GET | `/resource/[kind]/[id]/_history/[vid]` |
//! | update | PUT | `/resource/[kind]/[id]?pseudonym=` |
//! | patch | PATCH | `/resource/[kind]/[id]` (always 405) |
//! | delete | DELETE | `/resource/[kind]/[id]` |
//! | search | GET | `/resource/[kind]/_search?pseudonym=` |
//! | health | GET | `/health` |
//!
//! ## HTTP Headers
//!
//! - `ETag` - The bare version number of the returned version
//! - `Last-Modified` - When that version was written (RFC 3339)
//! - `Location` - Versioned path of a written resource
//! - `If-Match` - On PUT, only write if this is still the latest version

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod responses;
pub mod routing;
pub mod services;
pub mod state;

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::{RestError, RestResult};
pub use state::AppState;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use register_persistence::core::VersionedResourceRepository;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Creates the Axum application with default configuration.
///
/// For more control, use [`create_app_with_config`].
pub fn create_app(repository: Arc<dyn VersionedResourceRepository>) -> Router {
    create_app_with_config(repository, ServerConfig::default())
}

/// Creates the Axum application with custom configuration.
///
/// Pseudonym exchange and referral notification use the default mock
/// collaborators; use [`create_app_with_state`] to supply others.
pub fn create_app_with_config(
    repository: Arc<dyn VersionedResourceRepository>,
    config: ServerConfig,
) -> Router {
    create_app_with_state(AppState::new(repository, config))
}

/// Creates the Axum application from prepared state.
pub fn create_app_with_state(state: AppState) -> Router {
    let config = state.config().clone();

    info!(
        backend = state.service().repository().backend_name(),
        strategy = %state.service().repository().strategy(),
        "Creating register HTTP API"
    );

    let router = routing::create_routes(state);

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout),
        ));

    let router = if config.enable_cors {
        router.layer(build_cors_layer(&config))
    } else {
        router
    };

    router.layer(service_builder)
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.cors_origins == "*" {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup. `RUST_LOG` overrides
/// `level` when set.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "register_rest={level},register_metadata={level},register_persistence={level},tower_http=debug"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
