use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::DcfError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::DcfResult;

/// Shortest explicit forecast horizon the model accepts.
pub const MIN_FORECAST_YEARS: u32 = 5;
/// Longest explicit forecast horizon the model accepts.
pub const MAX_FORECAST_YEARS: u32 = 10;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input assumptions for the free-cash-flow projection.
///
/// Growth, margin and reinvestment are held flat across the whole forecast
/// period; this model deliberately has no year-by-year schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastAssumptions {
    /// Nominal base (Year 0) fiscal year, e.g. 2023
    pub base_year: i32,
    /// Base (Year 0) revenue
    pub base_revenue: Money,
    /// Observed FCF-to-revenue ratio in the base year
    pub base_margin: Rate,
    /// Observed reinvestment rate in the base year
    pub base_reinvestment: Rate,
    /// Revenue growth rate, compounded annually
    pub growth: Rate,
    /// Forward free-cash-flow margin as a fraction of revenue.
    /// Treated as already net of reinvestment.
    pub margin: Rate,
    /// Forward reinvestment rate. Carried for downstream display only; it
    /// does not reduce FCF further (see `margin`).
    pub reinvestment: Rate,
    /// Number of explicit forecast years (5 to 10)
    pub years: u32,
}

/// Projection for a single forecast year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub year: i32,
    pub revenue: Money,
    pub fcf: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project revenue and free cash flow over the explicit forecast period.
///
/// Revenue in year `i` is `base_revenue * (1 + growth)^i`, compounded from
/// the base each year rather than from the prior row, so repeated
/// multiplication cannot drift. FCF in year `i` is `revenue_i * margin`.
pub fn project(
    assumptions: &ForecastAssumptions,
) -> DcfResult<ComputationOutput<Vec<ForecastRow>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_assumptions(assumptions)?;

    // Reasonableness warnings, never errors: the caller owns economic
    // plausibility of growth/margin/reinvestment.
    if assumptions.growth.abs() > dec!(0.30) {
        warnings.push(format!(
            "Revenue growth of {} compounded over {} years is aggressive; verify the assumption",
            assumptions.growth, assumptions.years
        ));
    }
    if assumptions.margin.abs() > Decimal::ONE {
        warnings.push(format!(
            "FCF margin ({}) lies outside [-1, 1]; projected FCF will exceed revenue",
            assumptions.margin
        ));
    }

    let growth_factor = Decimal::ONE + assumptions.growth;
    let mut rows = Vec::with_capacity(assumptions.years as usize);
    for offset in 1..=assumptions.years {
        let revenue = assumptions.base_revenue * growth_factor.powi(offset as i64);
        let fcf = revenue * assumptions.margin;
        rows.push(ForecastRow {
            year: assumptions.base_year + offset as i32,
            revenue,
            fcf,
        });
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Constant-rate revenue and FCF projection",
        assumptions,
        warnings,
        elapsed,
        rows,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_assumptions(assumptions: &ForecastAssumptions) -> DcfResult<()> {
    if assumptions.base_revenue < Decimal::ZERO {
        return Err(DcfError::InvalidInput {
            field: "base_revenue".into(),
            reason: "Base revenue cannot be negative".into(),
        });
    }
    if assumptions.years < MIN_FORECAST_YEARS || assumptions.years > MAX_FORECAST_YEARS {
        return Err(DcfError::InvalidInput {
            field: "years".into(),
            reason: format!(
                "Forecast period must be between {MIN_FORECAST_YEARS} and {MAX_FORECAST_YEARS} years"
            ),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn sample_assumptions() -> ForecastAssumptions {
        ForecastAssumptions {
            base_year: 2023,
            base_revenue: dec!(100),
            base_margin: dec!(0.15),
            base_reinvestment: dec!(0.10),
            growth: dec!(0.05),
            margin: dec!(0.15),
            reinvestment: dec!(0.10),
            years: 5,
        }
    }

    #[test]
    fn test_row_count_and_year_labels() {
        let result = project(&sample_assumptions()).unwrap();
        let rows = &result.result;

        assert_eq!(rows.len(), 5);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.year, 2024 + i as i32);
        }
    }

    #[test]
    fn test_compounds_from_base_revenue() {
        let result = project(&sample_assumptions()).unwrap();
        let rows = &result.result;

        // 100 * 1.05 = 105; 100 * 1.05^2 = 110.25 — exact in Decimal
        assert_eq!(rows[0].revenue, dec!(105));
        assert_eq!(rows[0].fcf, dec!(15.75));
        assert_eq!(rows[1].revenue, dec!(110.25));
        assert_eq!(rows[1].fcf, dec!(16.5375));
    }

    #[test]
    fn test_zero_growth_holds_revenue_flat() {
        let mut assumptions = sample_assumptions();
        assumptions.growth = Decimal::ZERO;

        let result = project(&assumptions).unwrap();
        for row in &result.result {
            assert_eq!(row.revenue, dec!(100));
            assert_eq!(row.fcf, dec!(15));
        }
    }

    #[test]
    fn test_fcf_is_revenue_times_margin_every_row() {
        let assumptions = sample_assumptions();
        let result = project(&assumptions).unwrap();
        for row in &result.result {
            assert_eq!(row.fcf, row.revenue * assumptions.margin);
        }
    }

    #[test]
    fn test_negative_margin_allowed() {
        let mut assumptions = sample_assumptions();
        assumptions.margin = dec!(-0.05);

        let result = project(&assumptions).unwrap();
        assert!(result.result.iter().all(|r| r.fcf < Decimal::ZERO));
    }

    #[test]
    fn test_reinvestment_does_not_reduce_fcf() {
        let mut with_reinvestment = sample_assumptions();
        with_reinvestment.reinvestment = dec!(0.40);
        let mut without = sample_assumptions();
        without.reinvestment = Decimal::ZERO;

        let a = project(&with_reinvestment).unwrap();
        let b = project(&without).unwrap();
        assert_eq!(a.result, b.result);

        // but the assumption is still echoed for downstream consumers
        assert_eq!(
            a.assumptions.get("reinvestment"),
            Some(&serde_json::json!("0.40"))
        );
    }

    #[test]
    fn test_negative_base_revenue_rejected() {
        let mut assumptions = sample_assumptions();
        assumptions.base_revenue = dec!(-1);

        let result = project(&assumptions);
        assert!(matches!(
            result.unwrap_err(),
            DcfError::InvalidInput { field, .. } if field == "base_revenue"
        ));
    }

    #[test]
    fn test_years_out_of_range_rejected() {
        for years in [0, 4, 11] {
            let mut assumptions = sample_assumptions();
            assumptions.years = years;

            let result = project(&assumptions);
            assert!(
                matches!(result.unwrap_err(), DcfError::InvalidInput { field, .. } if field == "years"),
                "expected {years} forecast years to be rejected"
            );
        }
    }

    #[test]
    fn test_zero_base_revenue_projects_zero_rows() {
        let mut assumptions = sample_assumptions();
        assumptions.base_revenue = Decimal::ZERO;

        let result = project(&assumptions).unwrap();
        assert_eq!(result.result.len(), 5);
        for row in &result.result {
            assert_eq!(row.revenue, Decimal::ZERO);
            assert_eq!(row.fcf, Decimal::ZERO);
        }
    }

    #[test]
    fn test_aggressive_growth_warning() {
        let mut assumptions = sample_assumptions();
        assumptions.growth = dec!(0.50);

        let result = project(&assumptions).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("aggressive")));
    }

    #[test]
    fn test_methodology_string() {
        let result = project(&sample_assumptions()).unwrap();
        assert_eq!(result.methodology, "Constant-rate revenue and FCF projection");
    }
}
