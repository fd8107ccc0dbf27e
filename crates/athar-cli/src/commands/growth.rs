use clap::Args;
use serde_json::Value;

use athar_core::growth::projection::{self, ProjectionParameters};

use crate::input;

/// Arguments for a compound-growth projection
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ProjectArgs {
    /// Starting capital
    #[arg(long)]
    pub initial_amount: Option<f64>,

    /// Amount added every month
    #[arg(long)]
    pub monthly_contribution: Option<f64>,

    /// Horizon in years (1-100)
    #[arg(long)]
    pub years: Option<u32>,

    /// Annual return in percent (e.g. 8 for 8%)
    #[arg(long, alias = "rate")]
    pub annual_return_rate: Option<f64>,

    /// Annual inflation in percent
    #[arg(long, alias = "inflation")]
    pub annual_inflation_rate: Option<f64>,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params: ProjectionParameters = match input::load(args.input.as_deref())? {
        Some(params) => params,
        None => {
            let d = ProjectionParameters::default();
            ProjectionParameters {
                initial_amount: args.initial_amount.unwrap_or(d.initial_amount),
                monthly_contribution: args.monthly_contribution.unwrap_or(d.monthly_contribution),
                years: args.years.unwrap_or(d.years),
                annual_return_rate: args.annual_return_rate.unwrap_or(d.annual_return_rate),
                annual_inflation_rate: args
                    .annual_inflation_rate
                    .unwrap_or(d.annual_inflation_rate),
            }
        }
    };

    let result = projection::project_compound_growth(&params)?;
    Ok(serde_json::to_value(result)?)
}
