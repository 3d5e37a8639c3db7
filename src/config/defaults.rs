//! System-wide default constants.
//!
//! Environment variable names, file names and HTTP limits live here so the
//! binary, the config loader and the API agree on them.

// ============================================================================
// Configuration
// ============================================================================

/// Environment variable holding an explicit config file path.
pub const CONFIG_ENV_VAR: &str = "PON_BUDGET_CONFIG";

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "pon_budget.toml";

// ============================================================================
// HTTP Server
// ============================================================================

/// Default bind address.
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8080";

/// Environment variable overriding the bind address.
pub const SERVER_ADDR_ENV_VAR: &str = "PON_BUDGET_ADDR";

/// Comma-separated list of allowed CORS origins.
pub const CORS_ORIGINS_ENV_VAR: &str = "PON_BUDGET_CORS_ORIGINS";

/// Maximum accepted request body (bytes). A solve request is eight numbers.
pub const MAX_REQUEST_BODY_BYTES: usize = 16 * 1024;

// ============================================================================
// Splitter Catalog
// ============================================================================

/// Smallest meaningful split ratio (1:2).
pub const MIN_SPLITTER_PORTS: u32 = 2;
