mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::{ForecastArgs, ValueArgs, WaccArgs};

/// Discounted cash flow valuations with decimal precision
#[derive(Parser)]
#[command(
    name = "dcf",
    version,
    about = "Discounted cash flow valuations with decimal precision",
    long_about = "Projects free cash flows from a small set of assumptions, derives a \
                  CAPM-based WACC, and discounts the explicit period plus a Gordon \
                  growth terminal value to an intrinsic value per share."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Project revenue and free cash flow over the forecast period
    Forecast(ForecastArgs),
    /// Calculate the weighted average cost of capital (CAPM)
    Wacc(WaccArgs),
    /// Run the full valuation to intrinsic value per share
    Value(ValueArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Forecast(args) => commands::run_forecast(args),
        Commands::Wacc(args) => commands::run_wacc(args),
        Commands::Value(args) => commands::run_value(args),
        Commands::Version => {
            println!("dcf {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
