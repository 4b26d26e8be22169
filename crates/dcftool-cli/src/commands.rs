use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use dcftool_core::valuation::dcf::{self, DcfInput};
use dcftool_core::valuation::forecast::{self, ForecastAssumptions};
use dcftool_core::valuation::wacc::{self, WaccInput};

use crate::input;

/// Arguments for the FCF projection
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ForecastArgs {
    /// Base fiscal year, e.g. 2023
    #[arg(long)]
    pub base_year: Option<i32>,

    /// Base-year revenue
    #[arg(long)]
    pub base_revenue: Option<Decimal>,

    /// Base-year FCF margin (defaults to --margin)
    #[arg(long)]
    pub base_margin: Option<Decimal>,

    /// Base-year reinvestment rate (defaults to --reinvestment)
    #[arg(long)]
    pub base_reinvestment: Option<Decimal>,

    /// Revenue growth rate (e.g. 0.05 for 5%)
    #[arg(long)]
    pub growth: Option<Decimal>,

    /// Forward FCF margin as a fraction of revenue
    #[arg(long)]
    pub margin: Option<Decimal>,

    /// Forward reinvestment rate
    #[arg(long)]
    pub reinvestment: Option<Decimal>,

    /// Explicit forecast years (5-10)
    #[arg(long, default_value = "7")]
    pub years: u32,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for WACC calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct WaccArgs {
    /// Risk-free rate (e.g. 0.02 for 2%)
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,

    /// Levered beta
    #[arg(long)]
    pub beta: Option<Decimal>,

    /// Equity risk premium (e.g. 0.05 for 5%)
    #[arg(long, alias = "erp")]
    pub equity_risk_premium: Option<Decimal>,

    /// Pre-tax cost of debt
    #[arg(long)]
    pub cost_of_debt: Option<Decimal>,

    /// Marginal corporate tax rate
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Diluted shares outstanding
    #[arg(long)]
    pub shares_outstanding: Option<Decimal>,

    /// Net debt (total debt minus cash)
    #[arg(long)]
    pub net_debt: Option<Decimal>,

    /// Per-share proxy for market value of equity (weight split only)
    #[arg(long)]
    pub equity_value_per_share: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the full intrinsic-value run
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ValueArgs {
    /// Base fiscal year, e.g. 2023
    #[arg(long)]
    pub base_year: Option<i32>,

    /// Base-year revenue
    #[arg(long)]
    pub base_revenue: Option<Decimal>,

    /// Revenue growth rate
    #[arg(long)]
    pub growth: Option<Decimal>,

    /// Forward FCF margin
    #[arg(long)]
    pub margin: Option<Decimal>,

    /// Forward reinvestment rate
    #[arg(long)]
    pub reinvestment: Option<Decimal>,

    /// Explicit forecast years (5-10)
    #[arg(long, default_value = "7")]
    pub years: u32,

    /// Discount rate; omit and supply a wacc_input block via --input to
    /// derive it from capital-structure inputs instead
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Perpetuity growth rate for the terminal value
    #[arg(long)]
    pub terminal_growth: Option<Decimal>,

    /// Net debt for the equity bridge
    #[arg(long)]
    pub net_debt: Option<Decimal>,

    /// Diluted shares outstanding
    #[arg(long)]
    pub shares_outstanding: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_forecast(args: ForecastArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions: ForecastAssumptions = if let Some(ref path) = args.input {
        input::read_json(path)?
    } else if let Some(data) = input::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        forecast_from_flags(&args)?
    };

    let result = forecast::project(&assumptions)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_wacc(args: WaccArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let wacc_input: WaccInput = if let Some(ref path) = args.input {
        input::read_json(path)?
    } else if let Some(data) = input::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        WaccInput {
            risk_free_rate: args
                .risk_free_rate
                .ok_or("--risk-free-rate is required (or provide --input)")?,
            beta: args.beta.unwrap_or(dec!(1.0)),
            equity_risk_premium: args
                .equity_risk_premium
                .ok_or("--equity-risk-premium is required (or provide --input)")?,
            cost_of_debt: args
                .cost_of_debt
                .ok_or("--cost-of-debt is required (or provide --input)")?,
            tax_rate: args
                .tax_rate
                .ok_or("--tax-rate is required (or provide --input)")?,
            shares_outstanding: args
                .shares_outstanding
                .ok_or("--shares-outstanding is required (or provide --input)")?,
            net_debt: args.net_debt.unwrap_or(Decimal::ZERO),
            equity_value_per_share: args.equity_value_per_share,
        }
    };

    let result = wacc::calculate_wacc(&wacc_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_value(args: ValueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dcf_input: DcfInput = if let Some(ref path) = args.input {
        input::read_json(path)?
    } else if let Some(data) = input::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let margin = args.margin.ok_or("--margin is required (or provide --input)")?;
        let reinvestment = args.reinvestment.unwrap_or(Decimal::ZERO);
        DcfInput {
            forecast: ForecastAssumptions {
                base_year: args
                    .base_year
                    .ok_or("--base-year is required (or provide --input)")?,
                base_revenue: args
                    .base_revenue
                    .ok_or("--base-revenue is required (or provide --input)")?,
                base_margin: margin,
                base_reinvestment: reinvestment,
                growth: args.growth.ok_or("--growth is required (or provide --input)")?,
                margin,
                reinvestment,
                years: args.years,
            },
            discount_rate: Some(
                args.discount_rate
                    .ok_or("--discount-rate is required (or provide --input with a wacc_input block)")?,
            ),
            wacc_input: None,
            terminal_growth: args
                .terminal_growth
                .ok_or("--terminal-growth is required (or provide --input)")?,
            net_debt: args.net_debt.unwrap_or(Decimal::ZERO),
            shares_outstanding: args
                .shares_outstanding
                .ok_or("--shares-outstanding is required (or provide --input)")?,
            historical_fcf: None,
        }
    };

    let result = dcf::calculate_dcf(&dcf_input)?;
    Ok(serde_json::to_value(result)?)
}

fn forecast_from_flags(args: &ForecastArgs) -> Result<ForecastAssumptions, Box<dyn std::error::Error>> {
    let margin = args.margin.ok_or("--margin is required (or provide --input)")?;
    let reinvestment = args.reinvestment.unwrap_or(Decimal::ZERO);
    Ok(ForecastAssumptions {
        base_year: args
            .base_year
            .ok_or("--base-year is required (or provide --input)")?,
        base_revenue: args
            .base_revenue
            .ok_or("--base-revenue is required (or provide --input)")?,
        base_margin: args.base_margin.unwrap_or(margin),
        base_reinvestment: args.base_reinvestment.unwrap_or(reinvestment),
        growth: args.growth.ok_or("--growth is required (or provide --input)")?,
        margin,
        reinvestment,
        years: args.years,
    })
}
