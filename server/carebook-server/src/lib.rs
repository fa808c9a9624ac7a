//! Carebook Server - HTTP surface of the Carebook Engine
//!
//! Hosts the patient, appointment, leave and ledger services behind one axum
//! router with bearer-token authentication and role gates.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;

// Re-export commonly used types
pub use error::*;
pub use server::{CarebookServer, Unit};

use axum::{
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the main application router with all routes and middleware
pub fn create_app(server: CarebookServer) -> Router {
    routes::create_routes(server.unit)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::create_cors_layer(&server.config.server.cors_origins))
                .layer(from_fn(middleware::request_timing_middleware))
                .layer(from_fn_with_state(
                    server.clone(),
                    middleware::error_details_middleware,
                )),
        )
        .with_state(server)
}
