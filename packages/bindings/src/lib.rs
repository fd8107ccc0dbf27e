use napi::Result as NapiResult;
use napi_derive::napi;
use serde::{de::DeserializeOwned, Serialize};

use athar_core::dca::backtest;
use athar_core::growth::projection;
use athar_core::housing::buy_vs_rent;
use athar_core::income::passive;
use athar_core::monte_carlo::wealth;
use athar_core::mortgage::amortization;
use athar_core::portfolio::valuation;
use athar_core::AtharResult;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse the JSON parameters, run `f`, and serialise its output.
/// Missing fields fall back to the dashboard defaults.
fn call<I, O, F>(input_json: &str, f: F) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
    F: FnOnce(&I) -> AtharResult<O>,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = f(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Deterministic projections
// ---------------------------------------------------------------------------

#[napi]
pub fn project_compound_growth(input_json: String) -> NapiResult<String> {
    call(&input_json, projection::project_compound_growth)
}

#[napi]
pub fn mortgage_schedule(input_json: String) -> NapiResult<String> {
    call(&input_json, amortization::build_mortgage_schedule)
}

/// Monthly annuity payment for a bare loan. Rates in percent.
#[napi]
pub fn mortgage_payment(loan_amount: f64, annual_rate: f64, years: u32) -> NapiResult<f64> {
    amortization::compute_monthly_payment(loan_amount, annual_rate, years).map_err(to_napi_error)
}

#[napi]
pub fn compare_buy_vs_rent(input_json: String) -> NapiResult<String> {
    call(&input_json, buy_vs_rent::compare_buy_vs_rent)
}

#[napi]
pub fn passive_income(input_json: String) -> NapiResult<String> {
    call(&input_json, passive::compute_passive_income)
}

#[napi]
pub fn simulate_dca(input_json: String) -> NapiResult<String> {
    call(&input_json, backtest::simulate_dca)
}

#[napi]
pub fn analyze_portfolio(input_json: String) -> NapiResult<String> {
    call(&input_json, valuation::analyze_portfolio)
}

// ---------------------------------------------------------------------------
// Stochastic
// ---------------------------------------------------------------------------

/// Pass `seed` in the parameters for a reproducible run.
#[napi]
pub fn run_monte_carlo(input_json: String) -> NapiResult<String> {
    call(&input_json, wealth::run_monte_carlo)
}
