//! Link parameter model
//!
//! Eight interdependent quantities of a PON optical link. Each one is
//! independently optional: `None` means "solve for this", which is never the
//! same thing as a numeric zero.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::catalog::TypicalRanges;
use super::solver::BudgetError;

// ============================================================================
// Field Tags
// ============================================================================

/// One of the eight link quantities.
///
/// Declaration order is the canonical scan order used when looking for the
/// missing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkField {
    #[serde(rename = "p_tx_dbm")]
    TransmitPower,
    #[serde(rename = "s_rx_dbm")]
    ReceiverSensitivity,
    #[serde(rename = "fiber_length_km")]
    FiberLength,
    #[serde(rename = "fiber_attenuation_db_km")]
    FiberAttenuation,
    #[serde(rename = "connector_loss_db")]
    ConnectorLoss,
    #[serde(rename = "connector_count")]
    ConnectorCount,
    #[serde(rename = "splitter_loss_db")]
    SplitterLoss,
    #[serde(rename = "safety_margin_db")]
    SafetyMargin,
}

impl LinkField {
    /// All fields in canonical order.
    pub const ALL: [Self; 8] = [
        Self::TransmitPower,
        Self::ReceiverSensitivity,
        Self::FiberLength,
        Self::FiberAttenuation,
        Self::ConnectorLoss,
        Self::ConnectorCount,
        Self::SplitterLoss,
        Self::SafetyMargin,
    ];

    /// Stable key used in config files, JSON bodies and form fields.
    pub const fn key(self) -> &'static str {
        match self {
            Self::TransmitPower => "p_tx_dbm",
            Self::ReceiverSensitivity => "s_rx_dbm",
            Self::FiberLength => "fiber_length_km",
            Self::FiberAttenuation => "fiber_attenuation_db_km",
            Self::ConnectorLoss => "connector_loss_db",
            Self::ConnectorCount => "connector_count",
            Self::SplitterLoss => "splitter_loss_db",
            Self::SafetyMargin => "safety_margin_db",
        }
    }

    /// Human-readable label for reports and advisories.
    pub const fn label(self) -> &'static str {
        match self {
            Self::TransmitPower => "Transmit Power (Tx)",
            Self::ReceiverSensitivity => "Receiver Sensitivity (Rx)",
            Self::FiberLength => "Fiber Length",
            Self::FiberAttenuation => "Fiber Attenuation",
            Self::ConnectorLoss => "Loss per Connector",
            Self::ConnectorCount => "Connector Count",
            Self::SplitterLoss => "Splitter Loss",
            Self::SafetyMargin => "Safety Margin",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::TransmitPower | Self::ReceiverSensitivity => "dBm",
            Self::FiberLength => "km",
            Self::FiberAttenuation => "dB/km",
            Self::ConnectorLoss | Self::SplitterLoss | Self::SafetyMargin => "dB",
            Self::ConnectorCount => "",
        }
    }
}

impl fmt::Display for LinkField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for LinkField {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or_else(|| BudgetError::UnknownTarget(s.to_string()))
    }
}

// ============================================================================
// Parameter Set
// ============================================================================

/// The eight link quantities for one solve request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkParameters {
    /// Transmitter output power (dBm)
    #[serde(default)]
    pub p_tx_dbm: Option<f64>,
    /// Minimum receiver input power (dBm)
    #[serde(default)]
    pub s_rx_dbm: Option<f64>,
    /// Span length (km)
    #[serde(default)]
    pub fiber_length_km: Option<f64>,
    /// Fiber loss coefficient (dB/km)
    #[serde(default)]
    pub fiber_attenuation_db_km: Option<f64>,
    /// Loss per connector (dB)
    #[serde(default)]
    pub connector_loss_db: Option<f64>,
    /// Number of connectors
    #[serde(default)]
    pub connector_count: Option<i32>,
    /// Loss introduced by splitter(s) (dB)
    #[serde(default)]
    pub splitter_loss_db: Option<f64>,
    /// Reserved margin (dB)
    #[serde(default)]
    pub safety_margin_db: Option<f64>,
}

/// Result of scanning a parameter set for absent fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingFields {
    /// First absent field in canonical order
    pub first: Option<LinkField>,
    /// Total number of absent fields
    pub count: usize,
}

impl LinkParameters {
    /// Numeric value of a field, with the connector count widened to `f64`.
    pub fn get(&self, field: LinkField) -> Option<f64> {
        match field {
            LinkField::TransmitPower => self.p_tx_dbm,
            LinkField::ReceiverSensitivity => self.s_rx_dbm,
            LinkField::FiberLength => self.fiber_length_km,
            LinkField::FiberAttenuation => self.fiber_attenuation_db_km,
            LinkField::ConnectorLoss => self.connector_loss_db,
            LinkField::ConnectorCount => self.connector_count.map(f64::from),
            LinkField::SplitterLoss => self.splitter_loss_db,
            LinkField::SafetyMargin => self.safety_margin_db,
        }
    }

    /// Clear a field, marking it as the quantity to solve for.
    pub fn without(mut self, field: LinkField) -> Self {
        match field {
            LinkField::TransmitPower => self.p_tx_dbm = None,
            LinkField::ReceiverSensitivity => self.s_rx_dbm = None,
            LinkField::FiberLength => self.fiber_length_km = None,
            LinkField::FiberAttenuation => self.fiber_attenuation_db_km = None,
            LinkField::ConnectorLoss => self.connector_loss_db = None,
            LinkField::ConnectorCount => self.connector_count = None,
            LinkField::SplitterLoss => self.splitter_loss_db = None,
            LinkField::SafetyMargin => self.safety_margin_db = None,
        }
        self
    }

    /// Check every populated field that has a typical range.
    ///
    /// Never fails and never blocks a solve; the advisories come back in
    /// canonical field order.
    pub fn validate_ranges(&self, ranges: &TypicalRanges) -> Vec<RangeAdvisory> {
        LinkField::ALL
            .into_iter()
            .filter_map(|field| {
                let range = ranges.get(field)?;
                let value = self.get(field)?;
                (!range.contains(value)).then(|| RangeAdvisory {
                    field,
                    value,
                    min: range.min,
                    max: range.max,
                })
            })
            .collect()
    }

    /// Scan the fields in canonical order for absent values.
    pub fn find_missing(&self) -> MissingFields {
        let mut missing = LinkField::ALL
            .into_iter()
            .filter(|&field| self.get(field).is_none());
        let first = missing.next();
        MissingFields {
            first,
            count: first.map_or(0, |_| 1 + missing.count()),
        }
    }
}

// ============================================================================
// Range Advisory
// ============================================================================

/// A populated value outside its typical market range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeAdvisory {
    pub field: LinkField,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl fmt::Display for RangeAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WARNING: '{}' value ({}) is outside the typical market range ({} to {}).",
            self.field.label(),
            self.value,
            self.min,
            self.max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> LinkParameters {
        LinkParameters {
            p_tx_dbm: Some(5.0),
            s_rx_dbm: Some(-28.0),
            fiber_length_km: Some(15.0),
            fiber_attenuation_db_km: Some(0.25),
            connector_loss_db: Some(0.5),
            connector_count: Some(4),
            splitter_loss_db: Some(14.1),
            safety_margin_db: Some(2.0),
        }
    }

    #[test]
    fn test_field_keys_round_trip_through_from_str() {
        for field in LinkField::ALL {
            assert_eq!(field.key().parse::<LinkField>().unwrap(), field);
        }
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = "p_tx".parse::<LinkField>().unwrap_err();
        assert!(matches!(err, BudgetError::UnknownTarget(ref k) if k == "p_tx"));
    }

    #[test]
    fn test_find_missing_none_absent() {
        let scan = complete().find_missing();
        assert_eq!(scan.count, 0);
        assert_eq!(scan.first, None);
    }

    #[test]
    fn test_find_missing_reports_first_in_canonical_order() {
        let params = complete()
            .without(LinkField::SafetyMargin)
            .without(LinkField::FiberLength);
        let scan = params.find_missing();
        assert_eq!(scan.count, 2);
        assert_eq!(scan.first, Some(LinkField::FiberLength));
    }

    #[test]
    fn test_zero_is_not_absent() {
        let mut params = complete();
        params.connector_count = Some(0);
        params.splitter_loss_db = Some(0.0);
        assert_eq!(params.find_missing().count, 0);
    }

    #[test]
    fn test_validate_ranges_clean_for_typical_values() {
        let advisories = complete().validate_ranges(&TypicalRanges::default());
        assert!(advisories.is_empty(), "got {advisories:?}");
    }

    #[test]
    fn test_validate_ranges_orders_and_names_fields() {
        let mut params = complete();
        params.safety_margin_db = Some(5.0);
        params.p_tx_dbm = Some(9.0);
        let advisories = params.validate_ranges(&TypicalRanges::default());
        assert_eq!(advisories.len(), 2);
        assert_eq!(advisories[0].field, LinkField::TransmitPower);
        assert_eq!(advisories[1].field, LinkField::SafetyMargin);
        let text = advisories[0].to_string();
        assert!(text.contains("Transmit Power (Tx)"));
        assert!(text.contains("(9)"));
        assert!(text.contains("1 to 7"));
    }

    #[test]
    fn test_unranged_fields_never_advise() {
        let mut params = complete();
        params.fiber_length_km = Some(-500.0);
        params.connector_count = Some(-3);
        params.splitter_loss_db = Some(99.0);
        assert!(params.validate_ranges(&TypicalRanges::default()).is_empty());
    }

    #[test]
    fn test_absent_fields_are_skipped_by_range_check() {
        let params = LinkParameters::default();
        assert!(params.validate_ranges(&TypicalRanges::default()).is_empty());
    }
}
