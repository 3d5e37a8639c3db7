//! Plain-text rendering of a solve result.
//!
//! All computed quantities are printed with two decimal places so reports are
//! reproducible for golden-output comparisons.

use std::fmt;

use super::solver::{Derivation, Solution, SplitterFit, Verdict};

/// Render the multi-line report for a solution.
pub fn render(solution: &Solution) -> String {
    solution.to_string()
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.implied_target {
            f.write_str("No field was left blank; solving for the safety margin.\n\n")?;
        }
        write_derivation(f, &self.derivation)
    }
}

fn write_derivation(out: &mut fmt::Formatter<'_>, derivation: &Derivation) -> fmt::Result {
    match derivation {
        Derivation::SafetyMargin {
            gross_budget_db,
            total_loss_db,
            margin_db,
            low_margin_db,
            verdict,
        } => {
            writeln!(out, "Resulting Safety Margin:")?;
            writeln!(out, "  - Gross Power Budget: {gross_budget_db:.2} dB")?;
            writeln!(out, "  - Estimated Total Link Loss: {total_loss_db:.2} dB")?;
            writeln!(out, "  - SAFETY MARGIN: {margin_db:.2} dB")?;
            writeln!(out)?;
            match verdict {
                Verdict::Infeasible => {
                    write!(out, "  - ATTENTION: The margin is negative. The design is NOT VIABLE.")
                }
                Verdict::LowMargin => write!(
                    out,
                    "  - WARNING: The margin is positive but very low (< {low_margin_db:.2} dB). Risk of instability."
                ),
                Verdict::Viable => write!(out, "  - The design is VIABLE with the computed margin."),
            }
        }

        Derivation::TransmitPower {
            receiver_sensitivity_dbm,
            total_loss_db,
            safety_margin_db,
            min_transmit_power_dbm,
        } => {
            writeln!(
                out,
                "To cover losses of {total_loss_db:.2} dB, meet a sensitivity of {receiver_sensitivity_dbm:.2} dBm \
                 and keep a margin of {safety_margin_db:.2} dB,"
            )?;
            writeln!(out, "the minimum required transmit power is:")?;
            writeln!(out)?;
            write!(out, "  -> Minimum Transmit Power (Tx): {min_transmit_power_dbm:.2} dBm")
        }

        Derivation::ReceiverSensitivity {
            transmit_power_dbm,
            total_loss_db,
            safety_margin_db,
            max_sensitivity_dbm,
        } => {
            writeln!(
                out,
                "With Tx={transmit_power_dbm:.2} dBm, losses={total_loss_db:.2} dB and margin={safety_margin_db:.2} dB,"
            )?;
            writeln!(out, "the power reaching the receiver will be {max_sensitivity_dbm:.2} dBm.")?;
            writeln!(out, "The receiver sensitivity must therefore be at most:")?;
            writeln!(out)?;
            write!(out, "  -> Maximum Receiver Sensitivity (Rx): {max_sensitivity_dbm:.2} dBm")
        }

        Derivation::FiberLength {
            net_budget_db,
            fixed_loss_db,
            fiber_budget_db,
            max_length_km,
            verdict,
        } => {
            if *verdict == Verdict::Infeasible {
                writeln!(
                    out,
                    "The budget ({net_budget_db:.2} dB) does not cover the fixed losses ({fixed_loss_db:.2} dB)."
                )?;
                return write!(out, "The maximum reach is zero.");
            }
            writeln!(
                out,
                "With a net budget of {net_budget_db:.2} dB and fixed losses of {fixed_loss_db:.2} dB,"
            )?;
            writeln!(out, "{fiber_budget_db:.2} dB remain for the fiber. Therefore:")?;
            writeln!(out)?;
            write!(out, "  -> Maximum Fiber Reach: {max_length_km:.2} km")
        }

        Derivation::FiberAttenuation {
            net_budget_db,
            fixed_loss_db,
            max_attenuation_db_km,
            ..
        } => match max_attenuation_db_km {
            None => {
                writeln!(
                    out,
                    "The budget ({net_budget_db:.2} dB) does not cover the fixed losses ({fixed_loss_db:.2} dB)."
                )?;
                write!(out, "Attenuation calculation is not viable.")
            }
            Some(max) => {
                writeln!(out, "For the link to work with the given losses and margin,")?;
                writeln!(out, "the maximum fiber attenuation must be:")?;
                writeln!(out)?;
                write!(out, "  -> Maximum Attenuation: {max:.2} dB/km")
            }
        },

        Derivation::ConnectorCount {
            connector_budget_db,
            max_connectors,
            verdict,
            ..
        } => {
            if *verdict == Verdict::Infeasible {
                return write!(
                    out,
                    "The budget does not cover the other losses. There is no margin for any connector."
                );
            }
            writeln!(out, "With {connector_budget_db:.2} dB of budget remaining for connectors,")?;
            writeln!(out, "the maximum number of connectors allowed is:")?;
            writeln!(out)?;
            write!(out, "  -> Maximum Connector Count: {max_connectors}")
        }

        Derivation::ConnectorLoss {
            connector_budget_db,
            connector_count,
            max_loss_per_connector_db,
            ..
        } => match max_loss_per_connector_db {
            None => write!(
                out,
                "The budget does not cover the other losses. Calculation is not viable."
            ),
            Some(max) => {
                writeln!(
                    out,
                    "With a budget of {connector_budget_db:.2} dB for {connector_count} connectors,"
                )?;
                writeln!(out, "the maximum loss per connector must be:")?;
                writeln!(out)?;
                write!(out, "  -> Maximum Loss per Connector: {max:.2} dB")
            }
        },

        Derivation::SplitterLoss {
            net_budget_db,
            other_loss_db,
            max_splitter_loss_db,
            fit,
            ..
        } => {
            if *fit == SplitterFit::NoBudget {
                writeln!(
                    out,
                    "The budget ({net_budget_db:.2} dB) does not cover the other losses ({other_loss_db:.2} dB)."
                )?;
                return write!(out, "There is no margin for a splitter.");
            }
            writeln!(
                out,
                "Given the budget and the other losses, the maximum loss the splitter may introduce is:"
            )?;
            writeln!(out, "  -> Maximum Splitter Loss: {max_splitter_loss_db:.2} dB")?;
            writeln!(out)?;
            match fit {
                SplitterFit::Recommended { ratio, loss_db, .. } => write!(
                    out,
                    "  -> RECOMMENDATION: You can use a splitter of up to {ratio} (typical loss of {loss_db:.2} dB)."
                ),
                SplitterFit::NoStandardFit | SplitterFit::NoBudget => {
                    write!(out, "  -> RECOMMENDATION: No compatible standard splitter.")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution(derivation: Derivation) -> Solution {
        Solution {
            target: derivation.target(),
            implied_target: false,
            derivation,
        }
    }

    fn margin(margin_db: f64, verdict: Verdict) -> Derivation {
        Derivation::SafetyMargin {
            gross_budget_db: 33.0,
            total_loss_db: 33.0 - margin_db,
            margin_db,
            low_margin_db: 1.5,
            verdict,
        }
    }

    #[test]
    fn test_margin_report_lines() {
        let report = render(&solution(margin(13.15, Verdict::Viable)));
        assert!(report.contains("Gross Power Budget: 33.00 dB"));
        assert!(report.contains("Estimated Total Link Loss: 19.85 dB"));
        assert!(report.contains("SAFETY MARGIN: 13.15 dB"));
        assert!(report.contains("The design is VIABLE"));
    }

    #[test]
    fn test_low_margin_report_names_threshold() {
        let report = render(&solution(margin(1.0, Verdict::LowMargin)));
        assert!(report.contains("very low (< 1.50 dB)"));
    }

    #[test]
    fn test_negative_margin_report() {
        let report = render(&solution(margin(-1.0, Verdict::Infeasible)));
        assert!(report.contains("SAFETY MARGIN: -1.00 dB"));
        assert!(report.contains("NOT VIABLE"));
    }

    #[test]
    fn test_implied_target_is_announced() {
        let mut sol = solution(margin(13.15, Verdict::Viable));
        sol.implied_target = true;
        assert!(render(&sol).starts_with("No field was left blank"));
    }

    #[test]
    fn test_splitter_report_recommendation() {
        let report = render(&solution(Derivation::SplitterLoss {
            net_budget_db: 30.0,
            other_loss_db: 12.0,
            max_splitter_loss_db: 18.0,
            fit: SplitterFit::Recommended {
                ratio: "1:32".to_string(),
                loss_db: 17.5,
                rank: 4,
            },
            verdict: Verdict::Viable,
        }));
        assert!(report.contains("Maximum Splitter Loss: 18.00 dB"));
        assert!(report.contains("up to 1:32 (typical loss of 17.50 dB)"));
    }

    #[test]
    fn test_splitter_report_without_fit() {
        let report = render(&solution(Derivation::SplitterLoss {
            net_budget_db: 11.0,
            other_loss_db: 9.0,
            max_splitter_loss_db: 2.0,
            fit: SplitterFit::NoStandardFit,
            verdict: Verdict::Infeasible,
        }));
        assert!(report.contains("No compatible standard splitter"));
    }

    #[test]
    fn test_connector_count_report_is_integer() {
        let report = render(&solution(Derivation::ConnectorCount {
            net_budget_db: 30.0,
            fixed_loss_db: 24.5,
            connector_budget_db: 5.5,
            max_connectors: 7,
            verdict: Verdict::Viable,
        }));
        assert!(report.ends_with("Maximum Connector Count: 7"));
    }

    #[test]
    fn test_connector_loss_report_not_viable() {
        let report = render(&solution(Derivation::ConnectorLoss {
            net_budget_db: 24.0,
            fixed_loss_db: 27.0,
            connector_budget_db: -3.0,
            connector_count: 6,
            max_loss_per_connector_db: None,
            verdict: Verdict::Infeasible,
        }));
        assert_eq!(
            report,
            "The budget does not cover the other losses. Calculation is not viable."
        );
    }

    #[test]
    fn test_display_matches_render() {
        let sol = solution(margin(2.0, Verdict::Viable));
        assert_eq!(format!("{sol}"), render(&sol));
    }
}
