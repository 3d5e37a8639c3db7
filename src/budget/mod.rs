//! Power Budget Module
//!
//! Closed-form energy balance for a PON fiber link. Everything here is pure,
//! synchronous arithmetic with no I/O and no shared state.
//!
//! ## Flow
//! - Build a [`LinkParameters`] with exactly one field left as `None`
//!   (or none at all, which solves for the safety margin)
//! - [`LinkParameters::validate_ranges`] - advisory range checks, never blocks
//! - [`BudgetSolver::solve`] - dispatches to one of eight derivations
//! - [`report::render`] - two-decimal text report

pub mod catalog;
pub mod params;
pub mod report;
pub mod solver;

pub use catalog::{default_splitters, SplitterCatalog, SplitterEntry, TypicalRange, TypicalRanges};
pub use params::{LinkField, LinkParameters, MissingFields, RangeAdvisory};
pub use solver::{
    partial_losses, BudgetError, BudgetSolver, Derivation, LossBreakdown, LossContribution,
    Solution, SplitterFit, Verdict, DEFAULT_LOW_MARGIN_DB,
};

/// Advisories and solve outcome for one request.
///
/// The advisories are computed independently, so they are present even when
/// the solve itself fails.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub advisories: Vec<RangeAdvisory>,
    pub outcome: Result<Solution, BudgetError>,
}

impl Evaluation {
    /// Rendered report, if the solve succeeded.
    pub fn report(&self) -> Option<String> {
        self.outcome.as_ref().ok().map(report::render)
    }
}

/// Run the range checks and the solver on one parameter set.
pub fn evaluate(
    solver: &BudgetSolver,
    ranges: &TypicalRanges,
    params: &LinkParameters,
) -> Evaluation {
    Evaluation {
        advisories: params.validate_ranges(ranges),
        outcome: solver.solve(params),
    }
}
