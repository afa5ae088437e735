//! fleet-api - REST API layer for the gateway fleet service
//!
//! Exposes gateways and their device sub-resources over HTTP. All business
//! logic lives in `fleet_core::FleetService`.
//!
//! # Usage
//!
//! ```ignore
//! use fleet_api::{create_router, AppState};
//! use fleet_core::MemoryStore;
//!
//! let state = AppState::new(MemoryStore::new().repositories());
//! let router = create_router(state);
//! ```

pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the fleet REST API router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index::index))
        .route("/healthcheck", get(handlers::index::healthcheck))
        // Gateway routes
        .route(
            "/gateways",
            get(handlers::gateways::list_gateways).post(handlers::gateways::create_gateway),
        )
        .route(
            "/gateways/{gateway_id}",
            get(handlers::gateways::get_gateway)
                .put(handlers::gateways::update_gateway)
                .delete(handlers::gateways::delete_gateway),
        )
        // Device routes
        .route(
            "/gateways/{gateway_id}/devices",
            get(handlers::devices::list_devices)
                .post(handlers::devices::create_device)
                .put(handlers::devices::reconcile_devices),
        )
        .route(
            "/gateways/{gateway_id}/devices/{device_id}",
            get(handlers::devices::get_device)
                .put(handlers::devices::update_device)
                .delete(handlers::devices::delete_device),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
