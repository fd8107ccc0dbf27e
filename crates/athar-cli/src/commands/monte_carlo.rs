use clap::Args;
use serde_json::Value;

use athar_core::monte_carlo::wealth::{self, MonteCarloParameters};

use crate::input;

/// Arguments for the Monte Carlo wealth simulation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct MonteCarloArgs {
    /// Starting capital
    #[arg(long)]
    pub initial_amount: Option<f64>,

    /// Amount added every month
    #[arg(long)]
    pub monthly_contribution: Option<f64>,

    /// Horizon in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Mean annual return in percent
    #[arg(long, alias = "rate")]
    pub annual_return_rate: Option<f64>,

    /// Annual inflation in percent, used for the real median
    #[arg(long, alias = "inflation")]
    pub annual_inflation_rate: Option<f64>,

    /// Standard deviation of annual returns in percent
    #[arg(long, alias = "volatility")]
    pub volatility_percent: Option<f64>,

    /// Number of simulated paths (default 50)
    #[arg(long, alias = "paths")]
    pub path_count: Option<u32>,

    /// Seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Simulate paths in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Only print the summary, not every path
    #[arg(long)]
    pub summary_only: bool,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_monte_carlo(args: MonteCarloArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loaded: Option<MonteCarloParameters> = input::load(args.input.as_deref())?;
    let params = resolve_params(&args, loaded);

    let result = wealth::run_monte_carlo(&params)?;
    let mut value = serde_json::to_value(result)?;
    if args.summary_only {
        if let Some(result) = value.get_mut("result").and_then(Value::as_object_mut) {
            result.remove("paths");
            result.remove("expected_path");
        }
    }
    Ok(value)
}

/// Loaded parameters win over the model flags, but `--seed` and `--parallel`
/// control the run itself and are always applied on top.
fn resolve_params(
    args: &MonteCarloArgs,
    loaded: Option<MonteCarloParameters>,
) -> MonteCarloParameters {
    let mut params = loaded.unwrap_or_else(|| {
        let d = MonteCarloParameters::default();
        MonteCarloParameters {
            initial_amount: args.initial_amount.unwrap_or(d.initial_amount),
            monthly_contribution: args.monthly_contribution.unwrap_or(d.monthly_contribution),
            years: args.years.unwrap_or(d.years),
            annual_return_rate: args.annual_return_rate.unwrap_or(d.annual_return_rate),
            annual_inflation_rate: args
                .annual_inflation_rate
                .unwrap_or(d.annual_inflation_rate),
            volatility_percent: args.volatility_percent.unwrap_or(d.volatility_percent),
            path_count: args.path_count.unwrap_or(d.path_count),
            ..d
        }
    });
    if args.seed.is_some() {
        params.seed = args.seed;
    }
    if args.parallel {
        params.parallel = true;
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: MonteCarloArgs,
    }

    fn parse(argv: &[&str]) -> MonteCarloArgs {
        Harness::parse_from(std::iter::once("athar").chain(argv.iter().copied())).args
    }

    #[test]
    fn test_flags_build_parameters() {
        let args = parse(&["--years", "10", "--volatility", "0", "--seed", "9"]);
        let p = resolve_params(&args, None);
        assert_eq!(p.years, 10);
        assert_eq!(p.volatility_percent, 0.0);
        assert_eq!(p.seed, Some(9));
        assert!(!p.parallel);
    }

    #[test]
    fn test_run_flags_override_loaded_file() {
        let args = parse(&["--seed", "42", "--parallel", "--years", "3"]);
        let loaded = MonteCarloParameters {
            years: 30,
            seed: Some(1),
            ..MonteCarloParameters::default()
        };
        let p = resolve_params(&args, Some(loaded));
        assert_eq!(p.seed, Some(42));
        assert!(p.parallel);
        // Model flags do not override a loaded file
        assert_eq!(p.years, 30);
    }

    #[test]
    fn test_loaded_seed_kept_without_flag() {
        let args = parse(&[]);
        let loaded = MonteCarloParameters {
            seed: Some(7),
            parallel: true,
            ..MonteCarloParameters::default()
        };
        let p = resolve_params(&args, Some(loaded));
        assert_eq!(p.seed, Some(7));
        assert!(p.parallel);
    }
}
