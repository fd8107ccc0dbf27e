use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::AtharError;
use crate::mortgage::amortization::{Amortizer, MortgageParameters, DEFAULT_NOTARY_FEE_RATE};
use crate::types::{
    flag_atypical_rate, monthly_factor, require_finite, require_monthly_factor,
    require_non_negative, with_metadata, ComputationOutput, Money, Percent,
};
use crate::AtharResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Owning with a mortgage versus renting and investing the difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RentVsBuyParameters {
    pub property_price: Money,
    pub down_payment: Money,
    /// Both the mortgage term and the comparison horizon.
    pub years: u32,
    pub mortgage_rate: Percent,
    pub notary_fee_rate: Percent,
    pub property_appreciation_rate: Percent,
    pub property_tax_annual: Money,
    /// Yearly upkeep as a share of the purchase price.
    pub maintenance_rate_percent: Percent,
    pub monthly_rent: Money,
    pub rent_inflation_rate: Percent,
    pub market_return_rate: Percent,
}

impl Default for RentVsBuyParameters {
    fn default() -> Self {
        Self {
            property_price: 250_000.0,
            down_payment: 30_000.0,
            years: 25,
            mortgage_rate: 3.8,
            notary_fee_rate: DEFAULT_NOTARY_FEE_RATE,
            property_appreciation_rate: 2.0,
            property_tax_annual: 1_200.0,
            maintenance_rate_percent: 1.0,
            monthly_rent: 900.0,
            rent_inflation_rate: 2.0,
            market_return_rate: 8.0,
        }
    }
}

impl RentVsBuyParameters {
    pub fn mortgage(&self) -> MortgageParameters {
        MortgageParameters {
            property_price: self.property_price,
            down_payment: self.down_payment,
            years: self.years,
            annual_rate: self.mortgage_rate,
            notary_fee_rate: self.notary_fee_rate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Buy,
    Rent,
}

/// Both households' net wealth at the end of a year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WealthComparisonPoint {
    pub year: u32,
    pub owner_net_wealth: Money,
    pub renter_net_wealth: Money,
    pub property_value: Money,
    pub remaining_debt: Money,
    /// Rent paid each month during this year.
    pub monthly_rent: Money,
    /// Owner cost minus rent; negative when the renter draws on savings.
    pub monthly_savings: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentVsBuyOutput {
    pub notary_fees: Money,
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub initial_owner_wealth: Money,
    pub initial_renter_wealth: Money,
    pub series: Vec<WealthComparisonPoint>,
    pub winner: Winner,
    pub wealth_delta: Money,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(params: &RentVsBuyParameters) -> AtharResult<()> {
    if params.years == 0 {
        return Err(AtharError::invalid("years", "must be at least 1"));
    }
    require_finite("mortgage_rate", params.mortgage_rate)?;
    require_non_negative("property_tax_annual", params.property_tax_annual)?;
    require_non_negative("maintenance_rate_percent", params.maintenance_rate_percent)?;
    require_non_negative("monthly_rent", params.monthly_rent)?;
    require_finite("property_appreciation_rate", params.property_appreciation_rate)?;
    if params.property_appreciation_rate <= -100.0 {
        return Err(AtharError::degenerate(
            "property_appreciation_rate",
            "must be > -100%",
        ));
    }
    require_finite("rent_inflation_rate", params.rent_inflation_rate)?;
    if params.rent_inflation_rate <= -100.0 {
        return Err(AtharError::degenerate("rent_inflation_rate", "must be > -100%"));
    }
    require_monthly_factor("market_return_rate", params.market_return_rate)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Year-by-year net wealth of an owner and of a renter who invests the
/// down payment and every month's cost difference.
///
/// When rent exceeds the owner's monthly cost the difference is withdrawn
/// from the renter's portfolio, which is allowed to go negative.
pub fn compare(params: &RentVsBuyParameters) -> AtharResult<RentVsBuyOutput> {
    validate(params)?;

    let mortgage = params.mortgage();
    let notary_fees = mortgage.notary_fees();
    let loan_amount = mortgage.loan_amount()?;
    let mut amortizer = Amortizer::new(loan_amount, params.mortgage_rate, params.years)?;
    let monthly_payment = amortizer.monthly_payment();

    let monthly_owner_cost = monthly_payment
        + params.property_tax_annual / 12.0
        + params.property_price * params.maintenance_rate_percent / 100.0 / 12.0;
    let market_growth = monthly_factor(params.market_return_rate);

    let initial_owner_wealth = params.down_payment - notary_fees;
    let initial_renter_wealth = params.down_payment;

    let mut property_value = params.property_price;
    let mut renter_wealth = initial_renter_wealth;
    let mut current_rent = params.monthly_rent;
    let mut series = Vec::with_capacity(params.years as usize);

    for year in 1..=params.years {
        property_value *= 1.0 + params.property_appreciation_rate / 100.0;
        for _ in 0..12 {
            amortizer.step();
        }
        let remaining_debt = amortizer.remaining_principal();
        let owner_net_wealth = property_value - remaining_debt;

        let monthly_savings = monthly_owner_cost - current_rent;
        for _ in 0..12 {
            renter_wealth *= market_growth;
            renter_wealth += monthly_savings;
        }

        series.push(WealthComparisonPoint {
            year,
            owner_net_wealth,
            renter_net_wealth: renter_wealth,
            property_value,
            remaining_debt,
            monthly_rent: current_rent,
            monthly_savings,
        });

        current_rent *= 1.0 + params.rent_inflation_rate / 100.0;
    }

    let last = series
        .last()
        .ok_or_else(|| AtharError::InsufficientData("comparison produced no years".into()))?;
    let winner = if last.owner_net_wealth > last.renter_net_wealth {
        Winner::Buy
    } else {
        Winner::Rent
    };
    let wealth_delta = (last.owner_net_wealth - last.renter_net_wealth).abs();

    Ok(RentVsBuyOutput {
        notary_fees,
        loan_amount,
        monthly_payment,
        initial_owner_wealth,
        initial_renter_wealth,
        series,
        winner,
        wealth_delta,
    })
}

/// Run the comparison and wrap it in the output envelope.
pub fn compare_buy_vs_rent(
    input: &RentVsBuyParameters,
) -> AtharResult<ComputationOutput<RentVsBuyOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = compare(input)?;

    if let Some(first_negative) = output.series.iter().find(|p| p.renter_net_wealth < 0.0) {
        let msg = format!(
            "Renter portfolio is negative from year {} (rent exceeds ownership cost)",
            first_negative.year
        );
        warn!(year = first_negative.year, "{msg}");
        warnings.push(msg);
    }
    if output.initial_owner_wealth < 0.0 {
        let msg = format!(
            "Owner starts with negative net wealth of {:.2} after notary fees",
            output.initial_owner_wealth
        );
        warn!("{msg}");
        warnings.push(msg);
    }
    flag_atypical_rate("market_return_rate", input.market_return_rate, &mut warnings);
    flag_atypical_rate(
        "property_appreciation_rate",
        input.property_appreciation_rate,
        &mut warnings,
    );

    debug!(
        winner = ?output.winner,
        wealth_delta = output.wealth_delta,
        monthly_payment = output.monthly_payment,
        "buy vs rent compared"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Buy vs rent: amortised ownership against invested cost differential",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario_fees_and_loan() {
        let out = compare(&RentVsBuyParameters::default()).unwrap();
        assert_eq!(out.notary_fees, 20_000.0);
        assert_eq!(out.loan_amount, 240_000.0);
        assert_eq!(out.initial_owner_wealth, 10_000.0);
        assert_eq!(out.initial_renter_wealth, 30_000.0);
        assert_eq!(out.series.len(), 25);
        assert!(out.wealth_delta >= 0.0);
    }

    #[test]
    fn test_winner_matches_final_point() {
        let out = compare(&RentVsBuyParameters::default()).unwrap();
        let last = out.series.last().unwrap();
        let expected = if last.owner_net_wealth > last.renter_net_wealth {
            Winner::Buy
        } else {
            Winner::Rent
        };
        assert_eq!(out.winner, expected);
        assert_eq!(
            out.wealth_delta,
            (last.owner_net_wealth - last.renter_net_wealth).abs()
        );
    }

    #[test]
    fn test_debt_repaid_at_horizon() {
        let out = compare(&RentVsBuyParameters::default()).unwrap();
        let last = out.series.last().unwrap();
        assert!(last.remaining_debt < 0.01);
        // Owner holds the appreciated house outright
        let house = 250_000.0 * 1.02_f64.powi(25);
        assert!((last.owner_net_wealth - house).abs() < 0.05);
    }

    #[test]
    fn test_rent_inflates_yearly() {
        let out = compare(&RentVsBuyParameters::default()).unwrap();
        assert_eq!(out.series[0].monthly_rent, 900.0);
        assert!((out.series[1].monthly_rent - 918.0).abs() < 1e-9);
    }

    #[test]
    fn test_renter_withdraws_when_rent_is_higher() {
        let params = RentVsBuyParameters {
            monthly_rent: 5_000.0,
            market_return_rate: 0.0,
            ..RentVsBuyParameters::default()
        };
        let out = compare(&params).unwrap();
        assert!(out.series[0].monthly_savings < 0.0);
        assert!(out.series[0].renter_net_wealth < out.initial_renter_wealth);
        // Not clamped: the portfolio goes below zero
        assert!(out.series.last().unwrap().renter_net_wealth < 0.0);
        assert_eq!(out.winner, Winner::Buy);
    }

    #[test]
    fn test_negative_renter_wealth_warns() {
        let params = RentVsBuyParameters {
            monthly_rent: 5_000.0,
            ..RentVsBuyParameters::default()
        };
        let out = compare_buy_vs_rent(&params).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("Renter portfolio")));
    }

    #[test]
    fn test_zero_mortgage_rate_is_finite() {
        let params = RentVsBuyParameters {
            mortgage_rate: 0.0,
            ..RentVsBuyParameters::default()
        };
        let out = compare(&params).unwrap();
        assert_eq!(out.monthly_payment, 240_000.0 / 300.0);
        assert!(out.series.iter().all(|p| p.owner_net_wealth.is_finite()));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let zero_years = RentVsBuyParameters {
            years: 0,
            ..RentVsBuyParameters::default()
        };
        assert!(compare(&zero_years).is_err());

        let negative_price = RentVsBuyParameters {
            property_price: -1.0,
            ..RentVsBuyParameters::default()
        };
        assert!(compare(&negative_price).is_err());

        let oversized_down = RentVsBuyParameters {
            down_payment: 1_000_000.0,
            ..RentVsBuyParameters::default()
        };
        assert!(matches!(
            compare(&oversized_down).unwrap_err(),
            AtharError::InvalidInput { .. }
        ));

        let nan_rate = RentVsBuyParameters {
            mortgage_rate: f64::NAN,
            ..RentVsBuyParameters::default()
        };
        assert!(compare(&nan_rate).is_err());
    }

    #[test]
    fn test_winner_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Winner::Buy).unwrap(), "\"buy\"");
        assert_eq!(serde_json::to_string(&Winner::Rent).unwrap(), "\"rent\"");
    }
}
