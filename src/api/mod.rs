//! REST API module using Axum
//!
//! Provides HTTP endpoints for the power-budget calculator:
//! - v1 solve API (JSON and browser form submissions) with consistent envelope
//! - Reference data for the form's hints (typical ranges, splitter catalog)
//! - Liveness check at `/health`

pub mod envelope;
pub mod form;
pub mod handlers;
mod routes;

pub use handlers::ApiState;

use std::any::Any;

use axum::http::{header, Method};
use axum::response::Response;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::defaults;
use envelope::ApiErrorResponse;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `PON_BUDGET_CORS_ORIGINS` to a comma-separated list of allowed origins
/// when the form is served from another host.
fn build_cors_layer() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    match std::env::var(defaults::CORS_ORIGINS_ENV_VAR) {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            base.allow_origin(allowed)
        }
        Err(_) => base,
    }
}

/// Turn a handler panic into the generic 500 envelope.
fn panic_response(_: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("Handler panicked while processing a request");
    ApiErrorResponse::internal("The calculation failed unexpectedly")
}

/// Create the complete application router.
pub fn create_app(state: ApiState) -> Router {
    let cors = build_cors_layer();

    Router::new()
        .nest("/api/v1", routes::api_routes(state))
        .merge(routes::health_routes())
        .fallback(handlers::not_found)
        // Middleware
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(RequestBodyLimitLayer::new(defaults::MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
