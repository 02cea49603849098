//! Resource route configuration.

use axum::{
    Router,
    routing::{get, put},
};

use crate::handlers;
use crate::state::AppState;

/// Creates all register routes.
///
/// # Routes
///
/// ## Service
/// - `GET /` - Service banner
/// - `GET /health` - Health check
///
/// ## Type-level
/// - `GET /resource/{kind}/_search?pseudonym=` - Search by pseudonym
///
/// ## Instance-level
/// - `GET /resource/{kind}/{id}` - Read
/// - `PUT /resource/{kind}/{id}` - Update
/// - `PATCH /resource/{kind}/{id}` - Always 405
/// - `DELETE /resource/{kind}/{id}` - Delete
/// - `GET /resource/{kind}/{id}/_history/{vid}` - Version read
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // Service routes
        .route("/", get(handlers::index_handler))
        .route("/health", get(handlers::health_handler))
        // Type-level routes
        .route("/resource/{kind}/_search", get(handlers::search_handler))
        // Instance-level routes
        .route(
            "/resource/{kind}/{id}",
            put(handlers::update_handler)
                .get(handlers::read_handler)
                .patch(handlers::patch_handler)
                .delete(handlers::delete_handler),
        )
        .route(
            "/resource/{kind}/{id}/_history/{version}",
            get(handlers::vread_handler),
        )
        .fallback(handlers::not_found_handler)
        .with_state(state)
}
