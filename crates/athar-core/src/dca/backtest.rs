use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::AtharError;
use crate::types::{
    require_non_negative, require_positive, with_metadata, ComputationOutput, Money, Percent,
};
use crate::AtharResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Share of dividends given away to purify income from non-compliant activity.
pub const DEFAULT_PURIFICATION_RATE: Percent = 5.0;

/// One trading day of a price history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
    /// Dividend paid per share on this date, if any.
    #[serde(default)]
    pub dividend: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingHistory {
    pub ticker: String,
    pub bars: Vec<PriceBar>,
}

/// A monthly investment plan replayed over past prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DcaInput {
    /// Budget per month, split evenly across all holdings.
    pub monthly_amount: Money,
    /// Bars before 1 January of this year are ignored.
    pub start_year: i32,
    pub purification_rate: Percent,
    pub holdings: Vec<HoldingHistory>,
}

impl Default for DcaInput {
    fn default() -> Self {
        Self {
            monthly_amount: 100.0,
            start_year: 2018,
            purification_rate: DEFAULT_PURIFICATION_RATE,
            holdings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingResult {
    pub ticker: String,
    pub months_bought: u32,
    pub shares: f64,
    pub invested: Money,
    pub value: Money,
    pub dividends: Money,
    pub gain_percent: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcaOutput {
    pub monthly_amount: Money,
    pub amount_per_holding: Money,
    pub total_invested: Money,
    pub final_value: Money,
    pub dividends: Money,
    pub purification: Money,
    pub total_gain: Money,
    pub total_return: Percent,
    pub breakdown: Vec<HoldingResult>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Last close of each calendar month, in date order. Bars must be sorted.
fn month_end_closes(bars: &[PriceBar]) -> Vec<(i32, u32, f64)> {
    let mut closes: Vec<(i32, u32, f64)> = Vec::new();
    for bar in bars {
        let key = (bar.date.year(), bar.date.month());
        match closes.last_mut() {
            Some(last) if (last.0, last.1) == key => last.2 = bar.close,
            _ => closes.push((key.0, key.1, bar.close)),
        }
    }
    closes
}

/// Replay one holding. `None` when it has nothing to buy.
fn replay_holding(
    holding: &HoldingHistory,
    start: NaiveDate,
    amount: Money,
) -> Option<HoldingResult> {
    let mut bars: Vec<PriceBar> = holding
        .bars
        .iter()
        .filter(|b| b.date >= start && b.close.is_finite())
        .copied()
        .collect();
    bars.sort_by_key(|b| b.date);
    let last_close = bars.last()?.close;

    let mut shares = 0.0;
    let mut invested = 0.0;
    let mut months_bought = 0;
    for (_, _, close) in month_end_closes(&bars) {
        if close > 0.0 {
            shares += amount / close;
            invested += amount;
            months_bought += 1;
        }
    }
    if invested <= 0.0 {
        return None;
    }

    let dividends_per_share: f64 = bars
        .iter()
        .map(|b| b.dividend)
        .filter(|d| d.is_finite() && *d > 0.0)
        .sum();
    let value = shares * last_close;

    Some(HoldingResult {
        ticker: holding.ticker.clone(),
        months_bought,
        shares,
        invested,
        value,
        dividends: dividends_per_share * shares,
        gain_percent: (value - invested) / invested * 100.0,
    })
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Backtest a monthly dollar-cost-averaging plan over caller-supplied prices.
///
/// Dividends are approximated as the per-share total over the period times
/// the final share count.
pub fn simulate_dca(input: &DcaInput) -> AtharResult<ComputationOutput<DcaOutput>> {
    let start_time = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.holdings.is_empty() {
        return Err(AtharError::InsufficientData(
            "at least one holding is required".into(),
        ));
    }
    require_positive("monthly_amount", input.monthly_amount)?;
    require_non_negative("purification_rate", input.purification_rate)?;
    let start = NaiveDate::from_ymd_opt(input.start_year, 1, 1)
        .ok_or_else(|| AtharError::invalid("start_year", "not a representable year"))?;

    let amount_per_holding = input.monthly_amount / input.holdings.len() as f64;

    let mut breakdown = Vec::with_capacity(input.holdings.len());
    for holding in &input.holdings {
        match replay_holding(holding, start, amount_per_holding) {
            Some(result) => breakdown.push(result),
            None => {
                let msg = format!(
                    "{}: no usable prices since {}, skipped",
                    holding.ticker, input.start_year
                );
                warn!(ticker = %holding.ticker, "{msg}");
                warnings.push(msg);
            }
        }
    }

    let total_invested: f64 = breakdown.iter().map(|h| h.invested).sum();
    let final_value: f64 = breakdown.iter().map(|h| h.value).sum();
    let dividends: f64 = breakdown.iter().map(|h| h.dividends).sum();
    let purification = dividends * input.purification_rate / 100.0;
    let total_gain = final_value + dividends - total_invested;
    let total_return = if total_invested > 0.0 {
        total_gain / total_invested * 100.0
    } else {
        0.0
    };

    debug!(
        holdings = breakdown.len(),
        total_invested,
        final_value,
        "dca backtest replayed"
    );

    let output = DcaOutput {
        monthly_amount: input.monthly_amount,
        amount_per_holding,
        total_invested,
        final_value,
        dividends,
        purification,
        total_gain,
        total_return,
        breakdown,
    };

    let elapsed = start_time.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly dollar-cost averaging at month-end closes",
        &serde_json::json!({
            "monthly_amount": input.monthly_amount,
            "start_year": input.start_year,
            "purification_rate": input.purification_rate,
            "tickers": input.holdings.iter().map(|h| &h.ticker).collect::<Vec<_>>(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
