//! Calculator Configuration - reference data and server settings as TOML
//!
//! Every section is optional. An empty file produces exactly the built-in
//! typical-range table and splitter catalog.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::budget::{
    default_splitters, BudgetSolver, LinkField, SplitterCatalog, SplitterEntry, TypicalRange,
    TypicalRanges, DEFAULT_LOW_MARGIN_DB,
};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a calculator deployment.
///
/// Load with `CalculatorConfig::load()` which searches:
/// 1. `$PON_BUDGET_CONFIG` env var
/// 2. `./pon_budget.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Margin verdict tuning
    #[serde(default)]
    pub margin: MarginConfig,

    /// Per-field overrides of the typical-range table, keyed by field key
    #[serde(default)]
    pub ranges: BTreeMap<String, TypicalRange>,

    /// Splitter catalog (replaces the built-in one when present)
    #[serde(default = "default_splitters")]
    pub splitters: Vec<SplitterEntry>,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            margin: MarginConfig::default(),
            ranges: BTreeMap::new(),
            splitters: default_splitters(),
        }
    }
}

impl CalculatorConfig {
    /// Load configuration using the standard search order:
    /// 1. `$PON_BUDGET_CONFIG` environment variable
    /// 2. `./pon_budget.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), splitters = config.splitters.len(), "Loaded calculator config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./pon_budget.toml
        let local = PathBuf::from(defaults::CONFIG_FILE_NAME);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(splitters = config.splitters.len(), "Loaded calculator config from ./{}", defaults::CONFIG_FILE_NAME);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::CONFIG_FILE_NAME);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", defaults::CONFIG_FILE_NAME);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are logged as warnings with a suggested correction and
    /// never fail the load.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate ranges, the splitter catalog and the margin threshold.
    ///
    /// Suspicious-but-legal values are logged; impossible ones are returned
    /// as a single `ConfigError::Validation` listing every problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_physical_ranges(self);
        for w in &warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Typical-range table with this config's overrides applied.
    ///
    /// Overrides for unknown or unranged fields are skipped; `validate()`
    /// reports them.
    pub fn typical_ranges(&self) -> TypicalRanges {
        let mut table = TypicalRanges::default();
        for (key, range) in &self.ranges {
            if let Ok(field) = key.parse::<LinkField>() {
                table.set(field, *range);
            }
        }
        table
    }

    pub fn splitter_catalog(&self) -> SplitterCatalog {
        SplitterCatalog::new(self.splitters.clone())
    }

    /// Solver built from this config's catalog and margin threshold.
    pub fn solver(&self) -> BudgetSolver {
        BudgetSolver::new(self.splitter_catalog(), self.margin.low_warning_db)
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Margin Config
// ============================================================================

/// Safety-margin verdict tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginConfig {
    /// A non-negative margin below this value is reported as low (dB)
    #[serde(default = "default_low_warning_db")]
    pub low_warning_db: f64,
}

const fn default_low_warning_db() -> f64 {
    DEFAULT_LOW_MARGIN_DB
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            low_warning_db: default_low_warning_db(),
        }
    }
}

// ============================================================================
// Server Config
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `PON_BUDGET_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    defaults::DEFAULT_SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = CalculatorConfig::default();
        assert!(config.validate().is_ok(), "Default config must always validate");
    }

    #[test]
    fn test_empty_toml_produces_defaults() {
        let config: CalculatorConfig = toml::from_str("").expect("empty TOML should parse");
        assert_eq!(config.server.addr, "0.0.0.0:8080");
        assert_eq!(config.margin.low_warning_db, 1.5);
        assert!(config.ranges.is_empty());
        assert_eq!(config.splitters.len(), 6);
        assert_eq!(config.typical_ranges(), TypicalRanges::default());
    }

    #[test]
    fn test_partial_toml_override() {
        let toml_str = r#"
[margin]
low_warning_db = 2.0

[ranges.p_tx_dbm]
min = 0.5
max = 5.0
"#;
        let config = CalculatorConfig::from_toml_str(toml_str).expect("partial TOML should parse");
        assert_eq!(config.margin.low_warning_db, 2.0);
        let ranges = config.typical_ranges();
        assert_eq!(
            ranges.get(LinkField::TransmitPower),
            Some(TypicalRange::new(0.5, 5.0))
        );
        // Non-overridden values retain defaults
        assert_eq!(
            ranges.get(LinkField::SafetyMargin),
            Some(TypicalRange::new(1.5, 3.0))
        );
        assert_eq!(config.solver().low_margin_db(), 2.0);
    }

    #[test]
    fn test_splitter_table_replaces_catalog() {
        let toml_str = r#"
[[splitters]]
ratio = "1:8"
loss_db = 10.5

[[splitters]]
ratio = "1:4"
loss_db = 7.0
"#;
        let config = CalculatorConfig::from_toml_str(toml_str).expect("splitter TOML should parse");
        let catalog = config.splitter_catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entries()[0].ratio, "1:4");
    }

    #[test]
    fn test_validation_rejects_inverted_range() {
        let toml_str = r#"
[ranges.s_rx_dbm]
min = -20.0
max = -30.0
"#;
        let result = CalculatorConfig::from_toml_str(toml_str);
        match result {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("ranges.s_rx_dbm")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_is_reported() {
        let result = CalculatorConfig::from_toml_str("[margin\nlow_warning_db = ");
        assert!(matches!(result, Err(ConfigError::Parse(_, _))));
    }

    #[test]
    fn test_roundtrip_toml() {
        let mut original = CalculatorConfig::default();
        original
            .ranges
            .insert("connector_loss_db".to_string(), TypicalRange::new(0.1, 0.5));
        let toml_str = original.to_toml().expect("serialization should work");
        let roundtripped: CalculatorConfig =
            toml::from_str(&toml_str).expect("deserialization should work");
        assert_eq!(roundtripped.ranges, original.ranges);
        assert_eq!(roundtripped.splitters, original.splitters);
        assert_eq!(roundtripped.server.addr, original.server.addr);
    }

    #[test]
    fn test_all_sections_serialize() {
        let config = CalculatorConfig::default();
        let toml_str = config.to_toml().expect("serialization should work");
        assert!(toml_str.contains("[server]"), "Missing [server] section");
        assert!(toml_str.contains("[margin]"), "Missing [margin] section");
        assert!(toml_str.contains("[[splitters]]"), "Missing [[splitters]] tables");
        assert!(toml_str.contains("low_warning_db"), "Missing low_warning_db field");
    }
}
