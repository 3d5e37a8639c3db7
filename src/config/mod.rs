//! Calculator Configuration Module
//!
//! Loads the typical-range table, the splitter catalog, the low-margin
//! threshold and the HTTP bind address from TOML, falling back to built-in
//! defaults that match common GPON equipment.
//!
//! ## Loading Order
//!
//! 1. `PON_BUDGET_CONFIG` environment variable (path to TOML file)
//! 2. `pon_budget.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! // In main():
//! config::init(CalculatorConfig::load());
//!
//! // Anywhere in the codebase:
//! let solver = config::get().solver();
//! ```

mod calculator_config;
pub mod defaults;
pub mod validation;

pub use calculator_config::*;

use std::sync::OnceLock;

/// Global calculator configuration, initialized once at startup.
static CALCULATOR_CONFIG: OnceLock<CalculatorConfig> = OnceLock::new();

/// Initialize the global configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: CalculatorConfig) {
    if CALCULATOR_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get a reference to the global configuration.
///
/// Panics if `init()` has not been called. A missing config is a startup
/// bug, not a recoverable condition.
#[allow(clippy::expect_used)]
pub fn get() -> &'static CalculatorConfig {
    CALCULATOR_CONFIG
        .get()
        .expect("config::get() called before config::init(), this is a startup bug")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_init_wins() {
        let mut first = CalculatorConfig::default();
        first.margin.low_warning_db = 2.5;
        let mut second = CalculatorConfig::default();
        second.margin.low_warning_db = 4.0;

        init(first);
        init(second);

        assert_eq!(get().margin.low_warning_db, 2.5);
    }
}
