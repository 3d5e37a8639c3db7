//! Form-field decoding for the browser front-end.
//!
//! Every field arrives as a raw string. Blank means "solve for this"; a value
//! that cannot be read as a number is rejected instead of being treated as
//! zero.

use serde::Deserialize;
use thiserror::Error;

use crate::budget::{LinkField, LinkParameters};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("'{}' is not a valid number: '{raw}'", .field.label())]
    InvalidNumber { field: LinkField, raw: String },

    #[error("'{}' must be a whole number: '{raw}'", .field.label())]
    InvalidInteger { field: LinkField, raw: String },
}

/// Raw form submission, one optional string per link field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLinkForm {
    #[serde(default)]
    pub p_tx_dbm: Option<String>,
    #[serde(default)]
    pub s_rx_dbm: Option<String>,
    #[serde(default)]
    pub fiber_length_km: Option<String>,
    #[serde(default)]
    pub fiber_attenuation_db_km: Option<String>,
    #[serde(default)]
    pub connector_loss_db: Option<String>,
    #[serde(default)]
    pub connector_count: Option<String>,
    #[serde(default)]
    pub splitter_loss_db: Option<String>,
    #[serde(default)]
    pub safety_margin_db: Option<String>,
}

impl RawLinkForm {
    /// Decode every field, failing on the first unreadable one.
    pub fn to_parameters(&self) -> Result<LinkParameters, FormError> {
        Ok(LinkParameters {
            p_tx_dbm: parse_locale_number(LinkField::TransmitPower, self.p_tx_dbm.as_deref())?,
            s_rx_dbm: parse_locale_number(LinkField::ReceiverSensitivity, self.s_rx_dbm.as_deref())?,
            fiber_length_km: parse_locale_number(LinkField::FiberLength, self.fiber_length_km.as_deref())?,
            fiber_attenuation_db_km: parse_locale_number(
                LinkField::FiberAttenuation,
                self.fiber_attenuation_db_km.as_deref(),
            )?,
            connector_loss_db: parse_locale_number(LinkField::ConnectorLoss, self.connector_loss_db.as_deref())?,
            connector_count: parse_integer(LinkField::ConnectorCount, self.connector_count.as_deref())?,
            splitter_loss_db: parse_locale_number(LinkField::SplitterLoss, self.splitter_loss_db.as_deref())?,
            safety_margin_db: parse_locale_number(LinkField::SafetyMargin, self.safety_margin_db.as_deref())?,
        })
    }
}

/// Trimmed, non-blank input or `None`.
fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a decimal that may use a comma as decimal separator ("0,25").
///
/// Only a single separator is accepted; digit grouping ("1.234,5") and
/// non-finite spellings ("inf", "NaN") are rejected.
pub fn parse_locale_number(field: LinkField, raw: Option<&str>) -> Result<Option<f64>, FormError> {
    let Some(text) = non_blank(raw) else {
        return Ok(None);
    };

    let normalized = if text.contains(',') && !text.contains('.') {
        text.replacen(',', ".", 1)
    } else {
        text.to_string()
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| FormError::InvalidNumber {
            field,
            raw: text.to_string(),
        })
}

/// Parse a whole number such as a connector count.
pub fn parse_integer(field: LinkField, raw: Option<&str>) -> Result<Option<i32>, FormError> {
    let Some(text) = non_blank(raw) else {
        return Ok(None);
    };
    text.parse::<i32>()
        .map(Some)
        .map_err(|_| FormError::InvalidInteger {
            field,
            raw: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const F: LinkField = LinkField::FiberAttenuation;

    #[test]
    fn test_blank_is_absent() {
        assert_eq!(parse_locale_number(F, None), Ok(None));
        assert_eq!(parse_locale_number(F, Some("")), Ok(None));
        assert_eq!(parse_locale_number(F, Some("   ")), Ok(None));
        assert_eq!(parse_integer(LinkField::ConnectorCount, Some(" ")), Ok(None));
    }

    #[test]
    fn test_decimal_comma_and_point() {
        assert_eq!(parse_locale_number(F, Some("0,25")), Ok(Some(0.25)));
        assert_eq!(parse_locale_number(F, Some(" 0.25 ")), Ok(Some(0.25)));
        assert_eq!(parse_locale_number(F, Some("-28")), Ok(Some(-28.0)));
    }

    #[test]
    fn test_zero_stays_zero() {
        assert_eq!(parse_locale_number(F, Some("0")), Ok(Some(0.0)));
        assert_eq!(parse_integer(LinkField::ConnectorCount, Some("0")), Ok(Some(0)));
    }

    #[test]
    fn test_garbage_is_rejected_not_zeroed() {
        for raw in ["abc", "1.234,5", "1,2,3", "inf", "NaN"] {
            let err = parse_locale_number(F, Some(raw)).unwrap_err();
            assert!(matches!(err, FormError::InvalidNumber { .. }), "{raw} -> {err:?}");
        }
    }

    #[test]
    fn test_connector_count_must_be_integer() {
        let err = parse_integer(LinkField::ConnectorCount, Some("4,5")).unwrap_err();
        assert!(err.to_string().contains("Connector Count"));
        assert_eq!(parse_integer(LinkField::ConnectorCount, Some("4")), Ok(Some(4)));
    }

    #[test]
    fn test_form_to_parameters() {
        let form = RawLinkForm {
            p_tx_dbm: Some("5,0".into()),
            s_rx_dbm: Some("-28,0".into()),
            fiber_length_km: Some("15".into()),
            fiber_attenuation_db_km: Some("0,25".into()),
            connector_loss_db: Some("0.5".into()),
            connector_count: Some("4".into()),
            splitter_loss_db: Some("14,1".into()),
            safety_margin_db: Some(String::new()),
        };
        let params = form.to_parameters().unwrap();
        assert_eq!(params.p_tx_dbm, Some(5.0));
        assert_eq!(params.s_rx_dbm, Some(-28.0));
        assert_eq!(params.splitter_loss_db, Some(14.1));
        assert_eq!(params.connector_count, Some(4));
        assert_eq!(params.safety_margin_db, None);
    }
}
