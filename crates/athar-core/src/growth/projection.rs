use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::AtharError;
use crate::types::{
    flag_atypical_rate, monthly_factor, require_monthly_factor, require_non_negative,
    with_metadata, ComputationOutput, Money, Percent,
};
use crate::AtharResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Longest horizon the projector accepts, in years.
pub const MAX_YEARS: u32 = 100;

/// Parameters for a deterministic savings projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionParameters {
    pub initial_amount: Money,
    pub monthly_contribution: Money,
    pub years: u32,
    /// Nominal annual return, compounded monthly.
    pub annual_return_rate: Percent,
    /// Annual inflation used to deflate the nominal balance.
    pub annual_inflation_rate: Percent,
}

impl Default for ProjectionParameters {
    fn default() -> Self {
        Self {
            initial_amount: 5_000.0,
            monthly_contribution: 500.0,
            years: 20,
            annual_return_rate: 8.0,
            annual_inflation_rate: 2.0,
        }
    }
}

/// Balance snapshot at the end of a year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub year: u32,
    pub total_invested: Money,
    pub nominal_value: Money,
    pub real_value: Money,
}

/// Headline figures at the end of the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub total_invested: Money,
    pub total_value: Money,
    pub total_interest: Money,
    pub real_value: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionOutput {
    pub points: Vec<ProjectionPoint>,
    pub summary: ProjectionSummary,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub(crate) fn validate(params: &ProjectionParameters) -> AtharResult<()> {
    if params.years == 0 || params.years > MAX_YEARS {
        return Err(AtharError::invalid(
            "years",
            format!("must be between 1 and {MAX_YEARS}"),
        ));
    }
    require_non_negative("initial_amount", params.initial_amount)?;
    require_non_negative("monthly_contribution", params.monthly_contribution)?;
    require_monthly_factor("annual_return_rate", params.annual_return_rate)?;
    require_monthly_factor("annual_inflation_rate", params.annual_inflation_rate)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Project a savings balance month by month and emit one point per year.
///
/// Each month the balance grows by `annual_return_rate/12` and then receives
/// the contribution. The real value deflates the nominal balance by monthly
/// inflation over the months elapsed so far. Nothing is rounded.
pub fn project(params: &ProjectionParameters) -> AtharResult<Vec<ProjectionPoint>> {
    validate(params)?;

    let growth = monthly_factor(params.annual_return_rate);
    let inflation = monthly_factor(params.annual_inflation_rate);

    let mut balance = params.initial_amount;
    let mut invested = params.initial_amount;
    let mut deflator = 1.0_f64;
    let mut points = Vec::with_capacity(params.years as usize);

    for year in 1..=params.years {
        for _ in 0..12 {
            balance *= growth;
            balance += params.monthly_contribution;
            invested += params.monthly_contribution;
            deflator *= inflation;
        }
        points.push(ProjectionPoint {
            year,
            total_invested: invested,
            nominal_value: balance,
            real_value: balance / deflator,
        });
    }

    Ok(points)
}

/// Summarise the last point of a projection.
pub fn summarize(points: &[ProjectionPoint]) -> AtharResult<ProjectionSummary> {
    let last = points
        .last()
        .ok_or_else(|| AtharError::InsufficientData("projection has no points".into()))?;
    Ok(ProjectionSummary {
        total_invested: last.total_invested,
        total_value: last.nominal_value,
        total_interest: last.nominal_value - last.total_invested,
        real_value: last.real_value,
    })
}

/// Run a compound-growth projection and wrap it in the output envelope.
pub fn project_compound_growth(
    input: &ProjectionParameters,
) -> AtharResult<ComputationOutput<ProjectionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let points = project(input)?;
    let summary = summarize(&points)?;

    flag_atypical_rate("annual_return_rate", input.annual_return_rate, &mut warnings);
    flag_atypical_rate(
        "annual_inflation_rate",
        input.annual_inflation_rate,
        &mut warnings,
    );

    debug!(
        years = input.years,
        total_value = summary.total_value,
        real_value = summary.real_value,
        "compound growth projected"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly compound growth with inflation deflation",
        input,
        warnings,
        elapsed,
        ProjectionOutput { points, summary },
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
