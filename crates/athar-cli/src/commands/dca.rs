use clap::Args;
use serde_json::Value;

use athar_core::dca::backtest::{self, DcaInput};

use crate::input;

/// Arguments for a dollar-cost-averaging backtest
#[derive(Args)]
pub struct DcaArgs {
    /// Path to JSON or YAML input file with price histories
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_dca(args: DcaArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dca_input: DcaInput = input::load(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for a DCA backtest")?;
    let result = backtest::simulate_dca(&dca_input)?;
    Ok(serde_json::to_value(result)?)
}
