use clap::Args;
use serde_json::Value;

use athar_core::income::passive::{self, PassiveIncomeInput};

use crate::input;

/// Arguments for the passive income calculator
#[derive(Args)]
pub struct PassiveIncomeArgs {
    /// Invested capital
    #[arg(long)]
    pub capital: Option<f64>,

    /// Annual yield in percent
    #[arg(long, alias = "yield")]
    pub yield_rate: Option<f64>,

    /// Path to JSON or YAML input file with custom goals
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_passive_income(args: PassiveIncomeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params: PassiveIncomeInput = match input::load(args.input.as_deref())? {
        Some(params) => params,
        None => {
            let d = PassiveIncomeInput::default();
            PassiveIncomeInput {
                capital: args.capital.unwrap_or(d.capital),
                yield_rate: args.yield_rate.unwrap_or(d.yield_rate),
                goals: d.goals,
            }
        }
    };

    let result = passive::compute_passive_income(&params)?;
    Ok(serde_json::to_value(result)?)
}
