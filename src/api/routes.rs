//! API route definitions
//!
//! - /api/v1/solve - solve from JSON
//! - /api/v1/solve/form - solve from urlencoded form fields
//! - /api/v1/reference/ranges - typical-range table
//! - /api/v1/reference/splitters - splitter catalog

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, ApiState};

/// Create all v1 API routes
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/solve", post(handlers::solve_json))
        .route("/solve/form", post(handlers::solve_form))
        .route("/reference/ranges", get(handlers::reference_ranges))
        .route("/reference/splitters", get(handlers::reference_splitters))
        .with_state(state)
}

/// Liveness endpoint at root level
pub fn health_routes() -> Router {
    Router::new().route("/health", get(handlers::health))
}
