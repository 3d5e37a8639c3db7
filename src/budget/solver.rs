//! Power-budget solver
//!
//! The link obeys a single linear energy balance:
//!
//! ```text
//! P_tx - S_rx = attenuation * length + connector_loss * connectors + splitter_loss + margin
//! ```
//!
//! Given seven of the eight quantities, [`BudgetSolver::solve`] derives the
//! eighth with one closed-form formula per target. When nothing is absent the
//! safety margin is recomputed from the other seven and any supplied margin is
//! ignored; callers rely on that convention, so it is kept as-is.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::catalog::{SplitterCatalog, SplitterEntry};
use super::params::{LinkField, LinkParameters};

/// Margin below which a non-negative margin is reported as low (dB).
pub const DEFAULT_LOW_MARGIN_DB: f64 = 1.5;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BudgetError {
    #[error("More than one field was left blank ({missing} absent). The system is indeterminate and cannot be solved.")]
    IndeterminateSystem { missing: usize },

    #[error("Unknown target field: '{0}'")]
    UnknownTarget(String),

    #[error("{} must be a positive value for this calculation (got {value})", .field.label())]
    DomainError { field: LinkField, value: f64 },

    #[error("Required operand '{}' is missing", .0.label())]
    MissingOperand(LinkField),
}

// ============================================================================
// Result Types
// ============================================================================

/// Qualitative outcome of a derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Viable,
    LowMargin,
    Infeasible,
}

impl Verdict {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Viable => "viable",
            Self::LowMargin => "low margin",
            Self::Infeasible => "infeasible",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Splitter recommendation for the splitter-loss derivation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SplitterFit {
    /// Largest standard ratio whose loss fits the remaining budget
    Recommended {
        ratio: String,
        loss_db: f64,
        /// Position in the catalog, ascending by loss
        rank: usize,
    },
    /// Budget is non-negative but smaller than every catalog loss
    NoStandardFit,
    /// Other losses already exceed the budget
    NoBudget,
}

/// Loss contributions that can be left out of [`partial_losses`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossContribution {
    Fiber,
    Connectors,
    Splitter,
}

/// Individual loss contributions (dB).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LossBreakdown {
    pub fiber_db: f64,
    pub connectors_db: f64,
    pub splitter_db: f64,
}

impl LossBreakdown {
    pub fn total(&self) -> f64 {
        self.fiber_db + self.connectors_db + self.splitter_db
    }
}

/// Structured result of one derivation, tagged by target.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Derivation {
    SafetyMargin {
        gross_budget_db: f64,
        total_loss_db: f64,
        margin_db: f64,
        low_margin_db: f64,
        verdict: Verdict,
    },
    TransmitPower {
        receiver_sensitivity_dbm: f64,
        total_loss_db: f64,
        safety_margin_db: f64,
        min_transmit_power_dbm: f64,
    },
    ReceiverSensitivity {
        transmit_power_dbm: f64,
        total_loss_db: f64,
        safety_margin_db: f64,
        max_sensitivity_dbm: f64,
    },
    FiberLength {
        net_budget_db: f64,
        fixed_loss_db: f64,
        fiber_budget_db: f64,
        /// Zero when the fixed losses already exceed the budget
        max_length_km: f64,
        verdict: Verdict,
    },
    FiberAttenuation {
        net_budget_db: f64,
        fixed_loss_db: f64,
        fiber_budget_db: f64,
        max_attenuation_db_km: Option<f64>,
        verdict: Verdict,
    },
    ConnectorCount {
        net_budget_db: f64,
        fixed_loss_db: f64,
        connector_budget_db: f64,
        max_connectors: u32,
        verdict: Verdict,
    },
    ConnectorLoss {
        net_budget_db: f64,
        fixed_loss_db: f64,
        connector_budget_db: f64,
        connector_count: i32,
        max_loss_per_connector_db: Option<f64>,
        verdict: Verdict,
    },
    SplitterLoss {
        net_budget_db: f64,
        other_loss_db: f64,
        max_splitter_loss_db: f64,
        fit: SplitterFit,
        verdict: Verdict,
    },
}

impl Derivation {
    pub const fn target(&self) -> LinkField {
        match self {
            Self::SafetyMargin { .. } => LinkField::SafetyMargin,
            Self::TransmitPower { .. } => LinkField::TransmitPower,
            Self::ReceiverSensitivity { .. } => LinkField::ReceiverSensitivity,
            Self::FiberLength { .. } => LinkField::FiberLength,
            Self::FiberAttenuation { .. } => LinkField::FiberAttenuation,
            Self::ConnectorCount { .. } => LinkField::ConnectorCount,
            Self::ConnectorLoss { .. } => LinkField::ConnectorLoss,
            Self::SplitterLoss { .. } => LinkField::SplitterLoss,
        }
    }

    /// The derived quantity, in the unit of the target field.
    ///
    /// `None` when the derivation is infeasible and has no meaningful value.
    pub fn value(&self) -> Option<f64> {
        match *self {
            Self::SafetyMargin { margin_db, .. } => Some(margin_db),
            Self::TransmitPower { min_transmit_power_dbm, .. } => Some(min_transmit_power_dbm),
            Self::ReceiverSensitivity { max_sensitivity_dbm, .. } => Some(max_sensitivity_dbm),
            Self::FiberLength { max_length_km, .. } => Some(max_length_km),
            Self::FiberAttenuation { max_attenuation_db_km, .. } => max_attenuation_db_km,
            Self::ConnectorCount { max_connectors, .. } => Some(f64::from(max_connectors)),
            Self::ConnectorLoss { max_loss_per_connector_db, .. } => max_loss_per_connector_db,
            Self::SplitterLoss { max_splitter_loss_db, .. } => Some(max_splitter_loss_db),
        }
    }

    /// Verdict, for derivations that have one.
    pub const fn verdict(&self) -> Option<Verdict> {
        match *self {
            Self::SafetyMargin { verdict, .. }
            | Self::FiberLength { verdict, .. }
            | Self::FiberAttenuation { verdict, .. }
            | Self::ConnectorCount { verdict, .. }
            | Self::ConnectorLoss { verdict, .. }
            | Self::SplitterLoss { verdict, .. } => Some(verdict),
            Self::TransmitPower { .. } | Self::ReceiverSensitivity { .. } => None,
        }
    }
}

/// Successful solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    /// Field that was solved for
    pub target: LinkField,
    /// True when no field was absent and the margin was solved by convention
    pub implied_target: bool,
    pub derivation: Derivation,
}

// ============================================================================
// Partial Losses
// ============================================================================

/// Sum the loss contributions whose operands are present.
///
/// A contribution with an absent operand counts as zero; `exclude` leaves one
/// contribution out entirely when it contains the quantity being solved for.
pub fn partial_losses(params: &LinkParameters, exclude: Option<LossContribution>) -> LossBreakdown {
    let mut losses = LossBreakdown::default();

    if exclude != Some(LossContribution::Fiber) {
        if let (Some(attenuation), Some(length)) =
            (params.fiber_attenuation_db_km, params.fiber_length_km)
        {
            losses.fiber_db = attenuation * length;
        }
    }

    if exclude != Some(LossContribution::Connectors) {
        if let (Some(per_connector), Some(count)) = (params.connector_loss_db, params.connector_count) {
            losses.connectors_db = per_connector * f64::from(count);
        }
    }

    if exclude != Some(LossContribution::Splitter) {
        if let Some(splitter) = params.splitter_loss_db {
            losses.splitter_db = splitter;
        }
    }

    losses
}

// ============================================================================
// Solver
// ============================================================================

/// Stateless solver over an immutable splitter catalog.
#[derive(Debug, Clone)]
pub struct BudgetSolver {
    catalog: SplitterCatalog,
    low_margin_db: f64,
}

impl Default for BudgetSolver {
    fn default() -> Self {
        Self::new(SplitterCatalog::default(), DEFAULT_LOW_MARGIN_DB)
    }
}

impl BudgetSolver {
    pub const fn new(catalog: SplitterCatalog, low_margin_db: f64) -> Self {
        Self {
            catalog,
            low_margin_db,
        }
    }

    pub const fn catalog(&self) -> &SplitterCatalog {
        &self.catalog
    }

    pub const fn low_margin_db(&self) -> f64 {
        self.low_margin_db
    }

    /// Derive the single absent quantity.
    pub fn solve(&self, params: &LinkParameters) -> Result<Solution, BudgetError> {
        let missing = params.find_missing();
        if missing.count > 1 {
            return Err(BudgetError::IndeterminateSystem {
                missing: missing.count,
            });
        }

        let (target, implied_target) = match missing.first {
            Some(field) => (field, false),
            None => (LinkField::SafetyMargin, true),
        };
        debug!(field = %target, implied_target, "Solving power budget");

        let derivation = match target {
            LinkField::SafetyMargin => self.safety_margin(params)?,
            LinkField::TransmitPower => Self::transmit_power(params)?,
            LinkField::ReceiverSensitivity => Self::receiver_sensitivity(params)?,
            LinkField::FiberLength => Self::fiber_length(params)?,
            LinkField::FiberAttenuation => Self::fiber_attenuation(params)?,
            LinkField::ConnectorCount => Self::connector_count(params)?,
            LinkField::ConnectorLoss => Self::connector_loss(params)?,
            LinkField::SplitterLoss => self.splitter_loss(params)?,
        };

        Ok(Solution {
            target,
            implied_target,
            derivation,
        })
    }

    fn safety_margin(&self, params: &LinkParameters) -> Result<Derivation, BudgetError> {
        let gross_budget_db = gross_budget(params)?;
        let total_loss_db = partial_losses(params, None).total();
        let margin_db = gross_budget_db - total_loss_db;

        let verdict = if margin_db < 0.0 {
            Verdict::Infeasible
        } else if margin_db < self.low_margin_db {
            Verdict::LowMargin
        } else {
            Verdict::Viable
        };

        Ok(Derivation::SafetyMargin {
            gross_budget_db,
            total_loss_db,
            margin_db,
            low_margin_db: self.low_margin_db,
            verdict,
        })
    }

    fn transmit_power(params: &LinkParameters) -> Result<Derivation, BudgetError> {
        let receiver_sensitivity_dbm = operand(params, LinkField::ReceiverSensitivity)?;
        let safety_margin_db = operand(params, LinkField::SafetyMargin)?;
        let total_loss_db = partial_losses(params, None).total();

        Ok(Derivation::TransmitPower {
            receiver_sensitivity_dbm,
            total_loss_db,
            safety_margin_db,
            min_transmit_power_dbm: receiver_sensitivity_dbm + total_loss_db + safety_margin_db,
        })
    }

    fn receiver_sensitivity(params: &LinkParameters) -> Result<Derivation, BudgetError> {
        let transmit_power_dbm = operand(params, LinkField::TransmitPower)?;
        let safety_margin_db = operand(params, LinkField::SafetyMargin)?;
        let total_loss_db = partial_losses(params, None).total();

        Ok(Derivation::ReceiverSensitivity {
            transmit_power_dbm,
            total_loss_db,
            safety_margin_db,
            max_sensitivity_dbm: transmit_power_dbm - total_loss_db - safety_margin_db,
        })
    }

    fn fiber_length(params: &LinkParameters) -> Result<Derivation, BudgetError> {
        let attenuation = positive_operand(params, LinkField::FiberAttenuation)?;
        let net_budget_db = net_budget(params)?;
        let fixed_loss_db = partial_losses(params, Some(LossContribution::Fiber)).total();
        let fiber_budget_db = net_budget_db - fixed_loss_db;

        let (max_length_km, verdict) = if fiber_budget_db < 0.0 {
            (0.0, Verdict::Infeasible)
        } else {
            (fiber_budget_db / attenuation, Verdict::Viable)
        };

        Ok(Derivation::FiberLength {
            net_budget_db,
            fixed_loss_db,
            fiber_budget_db,
            max_length_km,
            verdict,
        })
    }

    fn fiber_attenuation(params: &LinkParameters) -> Result<Derivation, BudgetError> {
        let length = positive_operand(params, LinkField::FiberLength)?;
        let net_budget_db = net_budget(params)?;
        let fixed_loss_db = partial_losses(params, Some(LossContribution::Fiber)).total();
        let fiber_budget_db = net_budget_db - fixed_loss_db;

        let (max_attenuation_db_km, verdict) = if fiber_budget_db < 0.0 {
            (None, Verdict::Infeasible)
        } else {
            (Some(fiber_budget_db / length), Verdict::Viable)
        };

        Ok(Derivation::FiberAttenuation {
            net_budget_db,
            fixed_loss_db,
            fiber_budget_db,
            max_attenuation_db_km,
            verdict,
        })
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn connector_count(params: &LinkParameters) -> Result<Derivation, BudgetError> {
        let per_connector = positive_operand(params, LinkField::ConnectorLoss)?;
        let net_budget_db = net_budget(params)?;
        let fixed_loss_db = partial_losses(params, Some(LossContribution::Connectors)).total();
        let connector_budget_db = net_budget_db - fixed_loss_db;

        // Non-negative budget over a positive divisor; `as` saturates on overflow.
        let (max_connectors, verdict) = if connector_budget_db < 0.0 {
            (0, Verdict::Infeasible)
        } else {
            ((connector_budget_db / per_connector).floor() as u32, Verdict::Viable)
        };

        Ok(Derivation::ConnectorCount {
            net_budget_db,
            fixed_loss_db,
            connector_budget_db,
            max_connectors,
            verdict,
        })
    }

    fn connector_loss(params: &LinkParameters) -> Result<Derivation, BudgetError> {
        let connector_count = params
            .connector_count
            .ok_or(BudgetError::MissingOperand(LinkField::ConnectorCount))?;
        if connector_count <= 0 {
            return Err(BudgetError::DomainError {
                field: LinkField::ConnectorCount,
                value: f64::from(connector_count),
            });
        }
        let net_budget_db = net_budget(params)?;
        let fixed_loss_db = partial_losses(params, Some(LossContribution::Connectors)).total();
        let connector_budget_db = net_budget_db - fixed_loss_db;

        let (max_loss_per_connector_db, verdict) = if connector_budget_db < 0.0 {
            (None, Verdict::Infeasible)
        } else {
            (
                Some(connector_budget_db / f64::from(connector_count)),
                Verdict::Viable,
            )
        };

        Ok(Derivation::ConnectorLoss {
            net_budget_db,
            fixed_loss_db,
            connector_budget_db,
            connector_count,
            max_loss_per_connector_db,
            verdict,
        })
    }

    fn splitter_loss(&self, params: &LinkParameters) -> Result<Derivation, BudgetError> {
        let net_budget_db = net_budget(params)?;
        let other_loss_db = partial_losses(params, Some(LossContribution::Splitter)).total();
        let max_splitter_loss_db = net_budget_db - other_loss_db;

        let (fit, verdict) = if max_splitter_loss_db < 0.0 {
            (SplitterFit::NoBudget, Verdict::Infeasible)
        } else {
            match self.catalog.best_fit(max_splitter_loss_db) {
                Some((rank, SplitterEntry { ratio, loss_db })) => (
                    SplitterFit::Recommended {
                        ratio: ratio.clone(),
                        loss_db: *loss_db,
                        rank,
                    },
                    Verdict::Viable,
                ),
                None => (SplitterFit::NoStandardFit, Verdict::Infeasible),
            }
        };

        Ok(Derivation::SplitterLoss {
            net_budget_db,
            other_loss_db,
            max_splitter_loss_db,
            fit,
            verdict,
        })
    }
}

fn operand(params: &LinkParameters, field: LinkField) -> Result<f64, BudgetError> {
    params.get(field).ok_or(BudgetError::MissingOperand(field))
}

/// Operand used as a divisor; NaN is rejected alongside non-positive values.
fn positive_operand(params: &LinkParameters, field: LinkField) -> Result<f64, BudgetError> {
    let value = operand(params, field)?;
    if value.is_nan() || value <= 0.0 {
        return Err(BudgetError::DomainError { field, value });
    }
    Ok(value)
}

/// Raw optical budget before losses and margin: `P_tx - S_rx`.
fn gross_budget(params: &LinkParameters) -> Result<f64, BudgetError> {
    Ok(operand(params, LinkField::TransmitPower)? - operand(params, LinkField::ReceiverSensitivity)?)
}

/// Budget left for losses once the safety margin is reserved.
fn net_budget(params: &LinkParameters) -> Result<f64, BudgetError> {
    Ok(gross_budget(params)? - operand(params, LinkField::SafetyMargin)?)
}
