use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::DcfError;
use crate::types::{with_metadata, ComputationOutput, HistoricalFcf, Money, Rate};
use crate::DcfResult;

use super::forecast::{self, ForecastAssumptions, ForecastRow};
use super::wacc::{calculate_wacc, WaccInput};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input parameters for a full intrinsic-value run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfInput {
    /// Projection assumptions for the explicit forecast period
    pub forecast: ForecastAssumptions,
    /// Discount rate to use directly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Rate>,
    /// If provided, the discount rate is computed from this input
    /// (overrides `discount_rate`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wacc_input: Option<WaccInput>,
    /// Perpetuity growth rate for the terminal value
    pub terminal_growth: Rate,
    /// Net debt for the equity bridge
    pub net_debt: Money,
    /// Diluted shares outstanding for per-share value
    pub shares_outstanding: Decimal,
    /// Already-normalized historical FCF series, echoed back unchanged for
    /// the presentation layer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub historical_fcf: Option<Vec<HistoricalFcf>>,
}

/// Present value of a single projected cash flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountedCashFlow {
    pub year: i32,
    pub fcf: Money,
    pub discount_factor: Rate,
    pub pv: Money,
}

/// Every intermediate figure of the valuation, under stable field names, so
/// a consumer can audit the computation without recomputing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationDetails {
    /// Sum of present values of explicit-period cash flows
    pub pv_explicit: Money,
    /// Undiscounted Gordon-growth terminal value
    pub terminal_value: Money,
    /// Terminal value discounted to present
    pub pv_terminal: Money,
    /// Enterprise value = PV(explicit) + PV(terminal)
    pub enterprise_value: Money,
    /// Equity value = enterprise value - net debt
    pub equity_value: Money,
    pub net_debt: Money,
    pub shares_outstanding: Decimal,
    pub discount_rate: Rate,
    pub terminal_growth: Rate,
}

/// Output of the valuation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfOutput {
    pub intrinsic_value_per_share: Money,
    /// Year-by-year discounting of the explicit forecast period
    pub discounted: Vec<DiscountedCashFlow>,
    pub details: ValuationDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub historical_fcf: Option<Vec<HistoricalFcf>>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Discount projected cash flows and a Gordon-growth terminal value to an
/// intrinsic value per share.
///
/// For the row at 1-indexed offset `i`: DF_i = 1 / (1 + r)^i and
/// PV_i = FCF_i * DF_i. The terminal value is anchored at the final forecast
/// year N: TV = FCF_N * (1 + g) / (r - g), discounted at DF_N. Then
/// EV = sum(PV_i) + PV(TV), equity = EV - net debt, and per-share value is
/// equity / shares outstanding.
pub fn present_value(
    rows: &[ForecastRow],
    discount_rate: Rate,
    terminal_growth: Rate,
    net_debt: Money,
    shares_outstanding: Decimal,
) -> DcfResult<DcfOutput> {
    let last = rows.last().ok_or_else(|| DcfError::InvalidInput {
        field: "projection".into(),
        reason: "At least one projected cash flow is required".into(),
    })?;
    if discount_rate <= dec!(-1) {
        return Err(DcfError::InvalidInput {
            field: "discount_rate".into(),
            reason: "Discount rate must exceed -100% so discount factors stay positive".into(),
        });
    }
    if shares_outstanding <= Decimal::ZERO {
        return Err(DcfError::InvalidInput {
            field: "shares_outstanding".into(),
            reason: "Shares outstanding must be positive".into(),
        });
    }
    if discount_rate <= terminal_growth {
        return Err(DcfError::InvalidModelParameters(format!(
            "Discount rate ({discount_rate}) must exceed terminal growth ({terminal_growth}) for the Gordon growth model"
        )));
    }

    let one_plus_r = Decimal::ONE + discount_rate;
    let mut discounted = Vec::with_capacity(rows.len());
    let mut pv_explicit = Decimal::ZERO;
    let mut final_factor = Decimal::ONE;

    for (i, row) in rows.iter().enumerate() {
        let discount_factor = Decimal::ONE / one_plus_r.powi((i + 1) as i64);
        let pv = row.fcf * discount_factor;
        pv_explicit += pv;
        final_factor = discount_factor;
        discounted.push(DiscountedCashFlow {
            year: row.year,
            fcf: row.fcf,
            discount_factor,
            pv,
        });
    }

    let terminal_value =
        last.fcf * (Decimal::ONE + terminal_growth) / (discount_rate - terminal_growth);
    let pv_terminal = terminal_value * final_factor;
    let enterprise_value = pv_explicit + pv_terminal;
    let equity_value = enterprise_value - net_debt;
    let intrinsic_value_per_share = equity_value / shares_outstanding;

    Ok(DcfOutput {
        intrinsic_value_per_share,
        discounted,
        details: ValuationDetails {
            pv_explicit,
            terminal_value,
            pv_terminal,
            enterprise_value,
            equity_value,
            net_debt,
            shares_outstanding,
            discount_rate,
            terminal_growth,
        },
        historical_fcf: None,
    })
}

/// Run the full valuation: project cash flows, resolve the discount rate
/// (explicit or via the WACC module), and discount to intrinsic value.
pub fn calculate_dcf(input: &DcfInput) -> DcfResult<ComputationOutput<DcfOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let discount_rate = resolve_discount_rate(input, &mut warnings)?;

    let projection = forecast::project(&input.forecast)?;
    for w in &projection.warnings {
        warnings.push(format!("[forecast] {w}"));
    }

    let mut output = present_value(
        &projection.result,
        discount_rate,
        input.terminal_growth,
        input.net_debt,
        input.shares_outstanding,
    )?;
    output.historical_fcf = input.historical_fcf.clone();

    if !output.details.enterprise_value.is_zero() {
        let tv_pct = output.details.pv_terminal / output.details.enterprise_value;
        if tv_pct > dec!(0.75) {
            warnings.push(format!(
                "Terminal value represents {:.1}% of enterprise value; consider extending the explicit forecast period",
                tv_pct * dec!(100)
            ));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Single-stage FCF DCF (Gordon growth terminal value)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn resolve_discount_rate(input: &DcfInput, warnings: &mut Vec<String>) -> DcfResult<Rate> {
    if let Some(ref wacc_input) = input.wacc_input {
        let wacc_out = calculate_wacc(wacc_input)?;
        for w in &wacc_out.warnings {
            warnings.push(format!("[WACC] {w}"));
        }
        Ok(wacc_out.result.wacc)
    } else {
        input.discount_rate.ok_or_else(|| DcfError::InvalidInput {
            field: "discount_rate".into(),
            reason: "Either discount_rate or wacc_input must be provided".into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
