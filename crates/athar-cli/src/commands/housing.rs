use clap::Args;
use serde_json::Value;

use athar_core::housing::buy_vs_rent::{self, RentVsBuyParameters};

use crate::input;

/// Arguments for the buy-vs-rent comparison
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct BuyVsRentArgs {
    /// Purchase price of the property
    #[arg(long)]
    pub property_price: Option<f64>,

    /// Cash put down at purchase (the renter invests it instead)
    #[arg(long)]
    pub down_payment: Option<f64>,

    /// Mortgage term and comparison horizon in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Mortgage rate in percent
    #[arg(long)]
    pub mortgage_rate: Option<f64>,

    /// Notary fees in percent of the price
    #[arg(long)]
    pub notary_fee_rate: Option<f64>,

    /// Yearly property appreciation in percent
    #[arg(long, alias = "appreciation")]
    pub property_appreciation_rate: Option<f64>,

    /// Yearly property tax
    #[arg(long)]
    pub property_tax_annual: Option<f64>,

    /// Yearly maintenance in percent of the purchase price
    #[arg(long, alias = "maintenance")]
    pub maintenance_rate_percent: Option<f64>,

    /// Monthly rent in the first year
    #[arg(long, alias = "rent")]
    pub monthly_rent: Option<f64>,

    /// Yearly rent indexation in percent
    #[arg(long)]
    pub rent_inflation_rate: Option<f64>,

    /// Annual return on the renter's investments in percent
    #[arg(long, alias = "market-return")]
    pub market_return_rate: Option<f64>,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_buy_vs_rent(args: BuyVsRentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params: RentVsBuyParameters = match input::load(args.input.as_deref())? {
        Some(params) => params,
        None => {
            let d = RentVsBuyParameters::default();
            RentVsBuyParameters {
                property_price: args.property_price.unwrap_or(d.property_price),
                down_payment: args.down_payment.unwrap_or(d.down_payment),
                years: args.years.unwrap_or(d.years),
                mortgage_rate: args.mortgage_rate.unwrap_or(d.mortgage_rate),
                notary_fee_rate: args.notary_fee_rate.unwrap_or(d.notary_fee_rate),
                property_appreciation_rate: args
                    .property_appreciation_rate
                    .unwrap_or(d.property_appreciation_rate),
                property_tax_annual: args.property_tax_annual.unwrap_or(d.property_tax_annual),
                maintenance_rate_percent: args
                    .maintenance_rate_percent
                    .unwrap_or(d.maintenance_rate_percent),
                monthly_rent: args.monthly_rent.unwrap_or(d.monthly_rent),
                rent_inflation_rate: args.rent_inflation_rate.unwrap_or(d.rent_inflation_rate),
                market_return_rate: args.market_return_rate.unwrap_or(d.market_return_rate),
            }
        }
    };

    let result = buy_vs_rent::compare_buy_vs_rent(&params)?;
    Ok(serde_json::to_value(result)?)
}
