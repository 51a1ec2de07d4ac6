//! HTTP route handlers.
//!
//! The service exposes a single route. Anything else is answered by axum's
//! default 404/405 handling.
//!
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

pub mod status;

use axum::{middleware, routing::get, Router};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::middleware::request_id_layer;
use crate::state::AppState;

/// Cache-Control for the status payload; it is rebuilt on every request
pub const CACHE_CONTROL_STATUS: &str = "no-store";

/// Creates the Axum router with all routes and headers.
pub fn create_router(state: AppState) -> Router {
    let status_routes = Router::new()
        .route("/", get(status::index))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_STATUS),
        ));

    Router::new()
        .merge(status_routes)
        .with_state(state)
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
