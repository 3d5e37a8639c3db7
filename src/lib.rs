//! pon-budget: PON Link Power-Budget Solver
//!
//! Solves the energy balance of a passive optical network link for whichever
//! single quantity the designer leaves blank.
//!
//! ## Architecture
//!
//! - **Budget**: Pure solver, typical-range advisories, splitter catalog, report rendering
//! - **Config**: TOML-backed reference data with validation and key suggestions
//! - **API**: Axum HTTP front-end with JSON and browser-form submissions

pub mod api;
pub mod budget;
pub mod config;

// Re-export configuration
pub use config::CalculatorConfig;

// Re-export commonly used solver types
pub use budget::{
    evaluate, BudgetError, BudgetSolver, Derivation, Evaluation, LinkField, LinkParameters,
    RangeAdvisory, Solution, SplitterCatalog, SplitterEntry, SplitterFit, TypicalRange,
    TypicalRanges, Verdict,
};
