mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::dca::DcaArgs;
use commands::growth::ProjectArgs;
use commands::housing::BuyVsRentArgs;
use commands::income::PassiveIncomeArgs;
use commands::monte_carlo::MonteCarloArgs;
use commands::mortgage::MortgageArgs;
use commands::portfolio::PortfolioArgs;

/// Personal wealth projections: compound growth, mortgages, buy vs rent,
/// Monte Carlo.
#[derive(Parser)]
#[command(
    name = "athar",
    version,
    about = "Personal wealth projection engine",
    long_about = "Deterministic and stochastic projections for personal finance: \
                  compound growth with inflation, mortgage amortization, buy-vs-rent \
                  comparison, Monte Carlo wealth paths, passive income goals, \
                  dollar-cost-averaging backtests and portfolio purification. \
                  Rates are given in percent."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log computation details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Project a portfolio with monthly contributions and inflation
    Project(ProjectArgs),
    /// Mortgage payment, amortization schedule and total cost
    Mortgage(MortgageArgs),
    /// Compare owner and renter net wealth year by year
    BuyVsRent(BuyVsRentArgs),
    /// Simulate wealth paths with random annual returns
    MonteCarlo(MonteCarloArgs),
    /// Passive income from a capital base against lifestyle goals
    PassiveIncome(PassiveIncomeArgs),
    /// Backtest monthly dollar-cost averaging over price histories
    Dca(DcaArgs),
    /// Value positions and the dividends to purify each year
    Portfolio(PortfolioArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

/// Logs go to stderr so they never mix with formatted output.
/// `ATHAR_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("ATHAR_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!(format = ?cli.output, "athar {}", env!("CARGO_PKG_VERSION"));

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Project(args) => commands::growth::run_project(args),
        Commands::Mortgage(args) => commands::mortgage::run_mortgage(args),
        Commands::BuyVsRent(args) => commands::housing::run_buy_vs_rent(args),
        Commands::MonteCarlo(args) => commands::monte_carlo::run_monte_carlo(args),
        Commands::PassiveIncome(args) => commands::income::run_passive_income(args),
        Commands::Dca(args) => commands::dca::run_dca(args),
        Commands::Portfolio(args) => commands::portfolio::run_portfolio(args),
        Commands::Version => {
            println!("athar {}", env!("CARGO_PKG_VERSION"));
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
