use clap::Args;
use serde_json::Value;

use athar_core::portfolio::valuation::{self, PortfolioInput};

use crate::input;

/// Arguments for portfolio valuation and purification
#[derive(Args)]
pub struct PortfolioArgs {
    /// Path to JSON or YAML input file listing the positions
    #[arg(long)]
    pub input: Option<String>,

    /// Share of stock dividends to purify, in percent (default 5)
    #[arg(long)]
    pub stock_purification_rate: Option<f64>,
}

pub fn run_portfolio(args: PortfolioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut portfolio: PortfolioInput = input::load(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required to list positions")?;
    if let Some(rate) = args.stock_purification_rate {
        portfolio.stock_purification_rate = rate;
    }
    let result = valuation::analyze_portfolio(&portfolio)?;
    Ok(serde_json::to_value(result)?)
}
