//! API route handlers
//!
//! Request handling for the calculator endpoints:
//! - Liveness check
//! - Solve from a JSON body or from raw browser form fields
//! - Reference data (typical ranges, splitter catalog)

use std::sync::Arc;

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::State;
use axum::response::Response;
use axum::{Form, Json};
use serde::Serialize;
use tracing::{debug, error, info};

use super::envelope::{ApiErrorResponse, ApiResponse};
use super::form::RawLinkForm;
use crate::budget::{
    self, BudgetError, BudgetSolver, Derivation, LinkField, LinkParameters, SplitterEntry,
    TypicalRanges, Verdict,
};
use crate::config::CalculatorConfig;

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Solver carrying the splitter catalog and margin threshold
    pub solver: Arc<BudgetSolver>,
    /// Typical-range table used for advisories
    pub ranges: Arc<TypicalRanges>,
}

impl ApiState {
    pub fn new(solver: BudgetSolver, ranges: TypicalRanges) -> Self {
        Self {
            solver: Arc::new(solver),
            ranges: Arc::new(ranges),
        }
    }

    /// Build the state from a loaded configuration.
    pub fn from_config(config: &CalculatorConfig) -> Self {
        Self::new(config.solver(), config.typical_ranges())
    }
}

impl Default for ApiState {
    fn default() -> Self {
        Self::new(BudgetSolver::default(), TypicalRanges::default())
    }
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// ============================================================================
// Solve
// ============================================================================

/// Successful solve payload.
#[derive(Debug, Serialize)]
pub struct SolveResponse {
    pub target: LinkField,
    /// True when no field was blank and the margin was recomputed
    pub implied_target: bool,
    pub value: Option<f64>,
    pub verdict: Option<Verdict>,
    pub derivation: Derivation,
    pub report: String,
    pub advisories: Vec<String>,
}

/// POST /api/v1/solve - JSON body, absent or null fields are unknown
pub async fn solve_json(
    State(state): State<ApiState>,
    payload: Result<Json<LinkParameters>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(params)) => respond(&state, &params),
        Err(rejection) => {
            info!(error = %rejection.body_text(), "Rejected JSON body");
            ApiErrorResponse::bad_request(
                "Request body must be a JSON object of numeric link parameters",
            )
        }
    }
}

/// POST /api/v1/solve/form - urlencoded browser form with locale decimals
pub async fn solve_form(
    State(state): State<ApiState>,
    payload: Result<Form<RawLinkForm>, FormRejection>,
) -> Response {
    let raw = match payload {
        Ok(Form(raw)) => raw,
        Err(rejection) => {
            info!(error = %rejection.body_text(), "Rejected form body");
            return ApiErrorResponse::bad_request("Request body must be a urlencoded form");
        }
    };
    match raw.to_parameters() {
        Ok(params) => respond(&state, &params),
        Err(e) => {
            info!(error = %e, "Rejected form submission");
            ApiErrorResponse::bad_request(e.to_string())
        }
    }
}

fn respond(state: &ApiState, params: &LinkParameters) -> Response {
    let eval = budget::evaluate(&state.solver, &state.ranges, params);
    for advisory in &eval.advisories {
        debug!(field = %advisory.field, value = advisory.value, "Value outside typical range");
    }
    let advisories: Vec<String> = eval.advisories.iter().map(ToString::to_string).collect();

    match eval.outcome {
        Ok(solution) => {
            debug!(
                target_field = %solution.target,
                implied = solution.implied_target,
                advisories = advisories.len(),
                "Solved link budget"
            );
            ApiResponse::ok(SolveResponse {
                target: solution.target,
                implied_target: solution.implied_target,
                value: solution.derivation.value(),
                verdict: solution.derivation.verdict(),
                report: budget::report::render(&solution),
                derivation: solution.derivation,
                advisories,
            })
        }
        Err(e) => solve_error(&e, advisories),
    }
}

/// Map a solver failure to a response. Anything other than the two
/// user-facing failures is logged and reported without detail.
fn solve_error(err: &BudgetError, advisories: Vec<String>) -> Response {
    match err {
        BudgetError::IndeterminateSystem { .. } => {
            ApiErrorResponse::unprocessable("INDETERMINATE_SYSTEM", err.to_string(), advisories)
        }
        BudgetError::DomainError { .. } => {
            ApiErrorResponse::unprocessable("DOMAIN_ERROR", err.to_string(), advisories)
        }
        BudgetError::UnknownTarget(_) | BudgetError::MissingOperand(_) => {
            error!(error = %err, "Unexpected solver failure");
            ApiErrorResponse::internal("The calculation failed unexpectedly")
        }
    }
}

// ============================================================================
// Reference Data
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RangeRow {
    pub field: LinkField,
    pub label: &'static str,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
}

/// GET /api/v1/reference/ranges - active typical-range table
pub async fn reference_ranges(State(state): State<ApiState>) -> Response {
    let rows: Vec<RangeRow> = state
        .ranges
        .iter()
        .map(|(field, range)| RangeRow {
            field,
            label: field.label(),
            unit: field.unit(),
            min: range.min,
            max: range.max,
        })
        .collect();
    ApiResponse::ok(rows)
}

/// GET /api/v1/reference/splitters - catalog in ascending-loss order
pub async fn reference_splitters(State(state): State<ApiState>) -> Response {
    let entries: Vec<SplitterEntry> = state.solver.catalog().entries().to_vec();
    ApiResponse::ok(entries)
}

/// Fallback for unmatched paths.
pub async fn not_found() -> Response {
    ApiErrorResponse::not_found("No such endpoint")
}
