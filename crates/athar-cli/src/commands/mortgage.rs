use clap::Args;
use serde_json::Value;

use athar_core::mortgage::amortization::{self, MortgageParameters};

use crate::input;

/// Arguments for a mortgage schedule
#[derive(Args)]
pub struct MortgageArgs {
    /// Purchase price of the property
    #[arg(long)]
    pub property_price: Option<f64>,

    /// Cash put down at purchase
    #[arg(long)]
    pub down_payment: Option<f64>,

    /// Loan term in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Fixed annual interest rate in percent
    #[arg(long, alias = "rate")]
    pub annual_rate: Option<f64>,

    /// Notary fees in percent of the price (default 8)
    #[arg(long)]
    pub notary_fee_rate: Option<f64>,

    /// Only print the monthly payment for a bare loan of this size
    #[arg(long, conflicts_with_all = ["property_price", "down_payment", "notary_fee_rate", "input"])]
    pub loan_amount: Option<f64>,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_mortgage(args: MortgageArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let d = MortgageParameters::default();

    if let Some(loan) = args.loan_amount {
        let rate = args.annual_rate.unwrap_or(d.annual_rate);
        let years = args.years.unwrap_or(d.years);
        let payment = amortization::compute_monthly_payment(loan, rate, years)?;
        return Ok(serde_json::json!({
            "result": {
                "loan_amount": loan,
                "annual_rate": rate,
                "years": years,
                "monthly_payment": payment,
            }
        }));
    }

    let params: MortgageParameters = match input::load(args.input.as_deref())? {
        Some(params) => params,
        None => MortgageParameters {
            property_price: args.property_price.unwrap_or(d.property_price),
            down_payment: args.down_payment.unwrap_or(d.down_payment),
            years: args.years.unwrap_or(d.years),
            annual_rate: args.annual_rate.unwrap_or(d.annual_rate),
            notary_fee_rate: args.notary_fee_rate.unwrap_or(d.notary_fee_rate),
        },
    };

    let result = amortization::build_mortgage_schedule(&params)?;
    Ok(serde_json::to_value(result)?)
}
