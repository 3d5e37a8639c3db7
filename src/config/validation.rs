//! Config validation: unknown-key detection with Levenshtein suggestions
//! and reference-data sanity checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use super::defaults::MIN_SPLITTER_PORTS;
use crate::budget::{LinkField, TypicalRanges};

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `CalculatorConfig`.
///
/// Range sections are generated from the fields that carry a typical range.
/// Array-of-table entries (`[[splitters]]`) share their parent's prefix.
pub fn known_config_keys() -> HashSet<String> {
    let mut keys: HashSet<String> = [
        // [server]
        "server",
        "server.addr",
        // [margin]
        "margin",
        "margin.low_warning_db",
        // [ranges]
        "ranges",
        // [[splitters]]
        "splitters",
        "splitters.ratio",
        "splitters.loss_db",
    ]
    .iter()
    .map(|k| (*k).to_string())
    .collect();

    for field in LinkField::ALL {
        if TypicalRanges::supports(field) {
            let section = format!("ranges.{}", field.key());
            keys.insert(format!("{section}.min"));
            keys.insert(format!("{section}.max"));
            keys.insert(section);
        }
    }
    keys
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`. Tables inside arrays are walked with the array's
/// own path as prefix.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            } else if let Some(items) = v.as_array() {
                for item in items.iter().filter(|i| i.is_table()) {
                    for nested in walk_toml_keys(item, &path) {
                        if !keys.contains(&nested) {
                            keys.push(nested);
                        }
                    }
                }
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smallest key so the suggestion does
/// not depend on hash order.
pub fn suggest_correction(unknown: &str, known: &HashSet<String>) -> Option<String> {
    known
        .iter()
        .map(|k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.clone())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys. It only warns. Existing configs
/// always continue to work.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key))
        // Range overrides for bad field keys are hard errors in
        // validate_physical_ranges; do not double-report them here.
        .filter(|key| !(key.starts_with("ranges.") && key.matches('.').count() == 1))
        .map(|key| {
            let suggestion = suggest_correction(&key, &known);
            ValidationWarning {
                message: format!("Unknown config key '{key}'"),
                field: key,
                suggestion,
            }
        })
        .collect()
}

// ============================================================================
// Reference Data Validation
// ============================================================================

/// Validate ranges, the splitter catalog and the margin threshold.
///
/// Returns (errors, warnings). Errors are impossible values that must
/// prevent startup; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(
    config: &super::CalculatorConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Range overrides: known, ranged field with finite, ordered bounds
    for (key, range) in &config.ranges {
        match key.parse::<LinkField>() {
            Err(e) => errors.push(format!("ranges.{key}: {e}")),
            Ok(field) if !TypicalRanges::supports(field) => errors.push(format!(
                "ranges.{key}: '{}' has no typical range and cannot be overridden",
                field.label()
            )),
            Ok(_) => {
                if !range.min.is_finite() || !range.max.is_finite() {
                    errors.push(format!(
                        "ranges.{key}: bounds must be finite (got min={}, max={})",
                        range.min, range.max
                    ));
                } else if range.min > range.max {
                    errors.push(format!(
                        "ranges.{key}: min ({:.3}) must be <= max ({:.3})",
                        range.min, range.max
                    ));
                }
            }
        }
    }

    // Margin threshold: used as a comparison bound, must be a real number >= 0
    let low = config.margin.low_warning_db;
    if !low.is_finite() || low < 0.0 {
        errors.push(format!(
            "margin.low_warning_db = {low} must be a finite, non-negative value"
        ));
    }

    // Splitter catalog
    if config.splitters.is_empty() {
        errors.push("splitters: catalog must contain at least one entry".to_string());
    }

    let mut seen = HashSet::new();
    let mut by_ports = Vec::new();
    for entry in &config.splitters {
        if !seen.insert(entry.ratio.as_str()) {
            errors.push(format!("splitters: duplicate ratio '{}'", entry.ratio));
        }
        match entry.ports() {
            Some(ports) if ports >= MIN_SPLITTER_PORTS => by_ports.push((ports, entry)),
            _ => errors.push(format!(
                "splitters: ratio '{}' must look like '1:N' with N >= {MIN_SPLITTER_PORTS}",
                entry.ratio
            )),
        }
        if !entry.loss_db.is_finite() || entry.loss_db <= 0.0 {
            errors.push(format!(
                "splitters: loss for '{}' must be a positive finite value (got {})",
                entry.ratio, entry.loss_db
            ));
        }
    }

    // Loss should grow with split ratio; an inversion is legal but suspicious
    by_ports.sort_by_key(|(ports, _)| *ports);
    for pair in by_ports.windows(2) {
        let (lower, higher) = (pair[0].1, pair[1].1);
        if higher.loss_db < lower.loss_db {
            warnings.push(ValidationWarning {
                field: "splitters".to_string(),
                message: format!(
                    "splitter '{}' ({:.1} dB) has less loss than '{}' ({:.1} dB)",
                    higher.ratio, higher.loss_db, lower.ratio, lower.loss_db
                ),
                suggestion: None,
            });
        }
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::{SplitterEntry, TypicalRange};
    use crate::config::CalculatorConfig;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("hello", "hello"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("low_warnng_db", "low_warning_db"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [ranges.p_tx_dbm]
            min = 1.0
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"ranges".to_string()));
        assert!(keys.contains(&"ranges.p_tx_dbm".to_string()));
        assert!(keys.contains(&"ranges.p_tx_dbm.min".to_string()));
    }

    #[test]
    fn test_walk_toml_keys_array_of_tables() {
        let toml: toml::Value = r#"
            [[splitters]]
            ratio = "1:2"
            loss_db = 3.8

            [[splitters]]
            ratio = "1:4"
            loss_db = 7.3
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert_eq!(keys.len(), 3, "entries must not repeat keys: {keys:?}");
        assert!(keys.contains(&"splitters".to_string()));
        assert!(keys.contains(&"splitters.ratio".to_string()));
        assert!(keys.contains(&"splitters.loss_db".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[margin]
low_warnng_db = 2.0
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("margin.low_warning_db")
        );
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let toml_str = r#"
[server]
addr = "127.0.0.1:9000"

[margin]
low_warning_db = 1.5

[ranges.safety_margin_db]
min = 1.0
max = 4.0

[[splitters]]
ratio = "1:2"
loss_db = 3.8
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {warnings:?}");
    }

    #[test]
    fn test_known_keys_cover_ranged_fields_only() {
        let known = known_config_keys();
        assert!(known.contains("ranges.p_tx_dbm.min"));
        assert!(known.contains("ranges.safety_margin_db.max"));
        assert!(!known.contains("ranges.fiber_length_km"));
        assert!(!known.contains("ranges.connector_count.min"));
    }

    #[test]
    fn test_unknown_range_field_is_an_error() {
        let mut config = CalculatorConfig::default();
        config
            .ranges
            .insert("p_tx".to_string(), TypicalRange::new(1.0, 7.0));
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("ranges.p_tx")));
    }

    #[test]
    fn test_unranged_field_override_is_an_error() {
        let mut config = CalculatorConfig::default();
        config
            .ranges
            .insert("splitter_loss_db".to_string(), TypicalRange::new(0.0, 20.0));
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("has no typical range")));
    }

    #[test]
    fn test_non_finite_range_is_an_error() {
        let mut config = CalculatorConfig::default();
        config
            .ranges
            .insert("p_tx_dbm".to_string(), TypicalRange::new(f64::NAN, 7.0));
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("must be finite")));
    }

    #[test]
    fn test_splitter_errors() {
        let mut config = CalculatorConfig::default();
        config.splitters = vec![
            SplitterEntry::new("1:4", 7.3),
            SplitterEntry::new("1:4", 7.5),
            SplitterEntry::new("4", 7.5),
            SplitterEntry::new("1:8", -1.0),
        ];
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("duplicate ratio '1:4'")));
        assert!(errors.iter().any(|e| e.contains("ratio '4' must look like")));
        assert!(errors.iter().any(|e| e.contains("loss for '1:8'")));
    }

    #[test]
    fn test_empty_catalog_is_an_error() {
        let mut config = CalculatorConfig::default();
        config.splitters.clear();
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("at least one entry")));
    }

    #[test]
    fn test_non_monotonic_catalog_warns() {
        let mut config = CalculatorConfig::default();
        config.splitters = vec![
            SplitterEntry::new("1:2", 3.8),
            SplitterEntry::new("1:4", 3.0),
        ];
        let (errors, warnings) = validate_physical_ranges(&config);
        assert!(errors.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("'1:4'"));
    }

    #[test]
    fn test_negative_low_margin_is_an_error() {
        let mut config = CalculatorConfig::default();
        config.margin.low_warning_db = -1.0;
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("margin.low_warning_db")));
    }

    #[test]
    fn test_defaults_clean() {
        let (errors, warnings) = validate_physical_ranges(&CalculatorConfig::default());
        assert!(errors.is_empty(), "Defaults should produce no errors: {errors:?}");
        assert!(warnings.is_empty(), "Defaults should produce no warnings: {warnings:?}");
    }
}
