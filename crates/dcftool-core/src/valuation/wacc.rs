use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::DcfError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::DcfResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input parameters for the weighted average cost of capital.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaccInput {
    /// Risk-free rate (e.g. 10-year government bond yield)
    pub risk_free_rate: Rate,
    /// Levered beta of equity
    pub beta: Decimal,
    /// Equity risk premium (market return minus risk-free rate)
    pub equity_risk_premium: Rate,
    /// Pre-tax cost of debt
    pub cost_of_debt: Rate,
    /// Marginal corporate tax rate
    pub tax_rate: Rate,
    /// Diluted shares outstanding
    pub shares_outstanding: Decimal,
    /// Net debt (total debt minus cash); proxies the market value of debt
    pub net_debt: Money,
    /// Per-share proxy for the market value of equity, used only to split
    /// the capital-structure weights. When absent, 1.0 per share is assumed
    /// and a warning is emitted. Never derived from the valuation result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equity_value_per_share: Option<Decimal>,
}

/// Output of the WACC calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaccOutput {
    /// Weighted average cost of capital
    pub wacc: Rate,
    /// Cost of equity via CAPM
    pub cost_of_equity: Rate,
    /// After-tax cost of debt
    pub after_tax_cost_of_debt: Rate,
    /// Weight of equity in the capital structure
    pub equity_weight: Rate,
    /// Weight of debt in the capital structure
    pub debt_weight: Rate,
    /// Market value of equity used for the weight split
    pub market_value_of_equity: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Calculate the weighted average cost of capital using CAPM.
///
/// Cost of equity: Ke = Rf + Beta * ERP
/// After-tax cost of debt: Kd_at = Kd * (1 - t)
/// Weights: We = MVE / (MVE + net debt), Wd = net debt / (MVE + net debt),
/// with MVE = shares outstanding * equity value per share.
/// WACC = Ke * We + Kd_at * Wd
pub fn calculate_wacc(input: &WaccInput) -> DcfResult<ComputationOutput<WaccOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_wacc_input(input)?;

    let per_share = match input.equity_value_per_share {
        Some(v) => v,
        None => {
            warnings.push(
                "No equity value per share supplied; weighting equity at 1.0 per share".into(),
            );
            Decimal::ONE
        }
    };

    let market_value_of_equity = input.shares_outstanding * per_share;
    let total_capital = market_value_of_equity + input.net_debt;
    if total_capital.is_zero() {
        return Err(DcfError::InvalidInput {
            field: "shares_outstanding / net_debt".into(),
            reason: "Market value of equity and net debt are both zero; capital weights are undefined"
                .into(),
        });
    }

    let equity_weight = market_value_of_equity / total_capital;
    let debt_weight = input.net_debt / total_capital;

    let cost_of_equity = input.risk_free_rate + input.beta * input.equity_risk_premium;
    let after_tax_cost_of_debt = input.cost_of_debt * (Decimal::ONE - input.tax_rate);

    let wacc = cost_of_equity * equity_weight + after_tax_cost_of_debt * debt_weight;

    // Reasonableness warnings
    if input.beta > dec!(3.0) {
        warnings.push(format!(
            "High beta ({}): verify market data; betas above 3.0 are unusual",
            input.beta
        ));
    }
    if input.equity_risk_premium > dec!(0.10) {
        warnings.push(format!(
            "Equity risk premium ({}) exceeds 10%; verify estimate",
            input.equity_risk_premium
        ));
    }
    if wacc > dec!(0.20) {
        warnings.push(format!(
            "WACC of {wacc} exceeds 20%; appropriate for high-risk situations only"
        ));
    }

    let output = WaccOutput {
        wacc,
        cost_of_equity,
        after_tax_cost_of_debt,
        equity_weight,
        debt_weight,
        market_value_of_equity,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata("WACC via CAPM", input, warnings, elapsed, output))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_wacc_input(input: &WaccInput) -> DcfResult<()> {
    if input.risk_free_rate < Decimal::ZERO {
        return Err(DcfError::InvalidInput {
            field: "risk_free_rate".into(),
            reason: "Risk-free rate cannot be negative".into(),
        });
    }
    if input.equity_risk_premium < Decimal::ZERO {
        return Err(DcfError::InvalidInput {
            field: "equity_risk_premium".into(),
            reason: "Equity risk premium cannot be negative".into(),
        });
    }
    if input.beta <= Decimal::ZERO {
        return Err(DcfError::InvalidInput {
            field: "beta".into(),
            reason: "Beta must be positive".into(),
        });
    }
    if input.cost_of_debt < Decimal::ZERO {
        return Err(DcfError::InvalidInput {
            field: "cost_of_debt".into(),
            reason: "Cost of debt cannot be negative".into(),
        });
    }
    if input.tax_rate < Decimal::ZERO || input.tax_rate > Decimal::ONE {
        return Err(DcfError::InvalidInput {
            field: "tax_rate".into(),
            reason: "Tax rate must be between 0 and 1".into(),
        });
    }
    if input.shares_outstanding < Decimal::ZERO {
        return Err(DcfError::InvalidInput {
            field: "shares_outstanding".into(),
            reason: "Shares outstanding cannot be negative".into(),
        });
    }
    if let Some(v) = input.equity_value_per_share {
        if v < Decimal::ZERO {
            return Err(DcfError::InvalidInput {
                field: "equity_value_per_share".into(),
                reason: "Equity value per share cannot be negative".into(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input() -> WaccInput {
        WaccInput {
            risk_free_rate: dec!(0.02),
            beta: dec!(1.2),
            equity_risk_premium: dec!(0.05),
            cost_of_debt: dec!(0.04),
            tax_rate: dec!(0.21),
            shares_outstanding: dec!(1000),
            net_debt: Decimal::ZERO,
            equity_value_per_share: Some(dec!(50)),
        }
    }

    #[test]
    fn test_zero_debt_wacc_equals_cost_of_equity() {
        let result = calculate_wacc(&sample_input()).unwrap();
        let out = &result.result;

        // Ke = 0.02 + 1.2 * 0.05 = 0.08, and with no debt WACC == Ke exactly
        assert_eq!(out.cost_of_equity, dec!(0.08));
        assert_eq!(out.wacc, dec!(0.08));
        assert_eq!(out.equity_weight, Decimal::ONE);
        assert_eq!(out.debt_weight, Decimal::ZERO);
    }

    #[test]
    fn test_levered_wacc() {
        let mut input = sample_input();
        input.net_debt = dec!(500);
        input.equity_value_per_share = Some(dec!(1));

        let result = calculate_wacc(&input).unwrap();
        let out = &result.result;

        // MVE = 1000, debt = 500
        assert_eq!(out.market_value_of_equity, dec!(1000));
        // Kd_at = 0.04 * 0.79 = 0.0316
        assert_eq!(out.after_tax_cost_of_debt, dec!(0.0316));
        // WACC recomposed from its parts
        let expected =
            out.cost_of_equity * out.equity_weight + out.after_tax_cost_of_debt * out.debt_weight;
        assert_eq!(out.wacc, expected);
        // 2/3 equity, 1/3 debt
        assert!((out.equity_weight - dec!(0.6667)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_weights_sum_to_one() {
        let mut input = sample_input();
        input.net_debt = dec!(500);
        input.equity_value_per_share = Some(dec!(1));

        let result = calculate_wacc(&input).unwrap();
        let out = &result.result;
        assert_eq!(out.equity_weight + out.debt_weight, Decimal::ONE);
    }

    #[test]
    fn test_weights_invariant_to_capital_scaling() {
        let mut input = sample_input();
        input.net_debt = dec!(500);
        input.equity_value_per_share = Some(dec!(1));
        let base = calculate_wacc(&input).unwrap();

        // Double both sides of the capital structure
        input.shares_outstanding = dec!(2000);
        input.net_debt = dec!(1000);
        let scaled = calculate_wacc(&input).unwrap();

        assert_eq!(base.result.equity_weight, scaled.result.equity_weight);
        assert_eq!(base.result.debt_weight, scaled.result.debt_weight);
        assert_eq!(base.result.wacc, scaled.result.wacc);
    }

    #[test]
    fn test_zero_capital_rejected() {
        let mut input = sample_input();
        input.shares_outstanding = Decimal::ZERO;
        input.net_debt = Decimal::ZERO;

        let result = calculate_wacc(&input);
        match result.unwrap_err() {
            DcfError::InvalidInput { field, .. } => {
                assert!(field.contains("net_debt"));
            }
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }

    #[test]
    fn test_default_per_share_proxy_warns() {
        let mut input = sample_input();
        input.equity_value_per_share = None;

        let result = calculate_wacc(&input).unwrap();
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("1.0 per share")));
        // MVE falls back to shares * 1.0
        assert_eq!(result.result.market_value_of_equity, dec!(1000));
    }

    #[test]
    fn test_negative_rate_rejected() {
        let mut input = sample_input();
        input.risk_free_rate = dec!(-0.01);

        assert!(calculate_wacc(&input).is_err());
    }

    #[test]
    fn test_tax_rate_bounds() {
        let mut input = sample_input();
        input.tax_rate = dec!(1.2);
        assert!(calculate_wacc(&input).is_err());

        input.tax_rate = dec!(-0.1);
        assert!(calculate_wacc(&input).is_err());
    }

    #[test]
    fn test_zero_beta_rejected() {
        let mut input = sample_input();
        input.beta = Decimal::ZERO;

        assert!(calculate_wacc(&input).is_err());
    }

    #[test]
    fn test_high_beta_warning() {
        let mut input = sample_input();
        input.beta = dec!(3.5);

        let result = calculate_wacc(&input).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("High beta")));
    }

    #[test]
    fn test_methodology_string() {
        let result = calculate_wacc(&sample_input()).unwrap();
        assert_eq!(result.methodology, "WACC via CAPM");
    }
}
