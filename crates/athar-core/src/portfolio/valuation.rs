use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::AtharError;
use crate::types::{require_non_negative, with_metadata, ComputationOutput, Money, Percent};
use crate::AtharResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Dividends given away on ordinary stocks to offset non-compliant income.
pub const DEFAULT_STOCK_PURIFICATION_RATE: Percent = 5.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    #[default]
    Stock,
    /// Shariah ETFs purify internally.
    EtfIslamic,
    /// Asset-backed, no interest income to purify.
    Sukuk,
}

/// One holding, priced by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub quantity: f64,
    /// Average purchase price per unit.
    pub average_price: Money,
    /// Latest price; the average price stands in when absent.
    #[serde(default)]
    pub current_price: Option<Money>,
    /// Trailing annual dividend yield.
    #[serde(default)]
    pub dividend_yield: Percent,
    #[serde(default)]
    pub asset_type: AssetType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioInput {
    pub positions: Vec<Position>,
    pub stock_purification_rate: Percent,
}

impl Default for PortfolioInput {
    fn default() -> Self {
        Self {
            positions: Vec::new(),
            stock_purification_rate: DEFAULT_STOCK_PURIFICATION_RATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionValuation {
    pub ticker: String,
    pub asset_type: AssetType,
    pub quantity: f64,
    pub current_price: Money,
    /// True when no current price was supplied.
    pub priced_at_cost: bool,
    pub cost_basis: Money,
    pub current_value: Money,
    pub gain: Money,
    pub gain_percent: Percent,
    pub annual_dividends: Money,
    pub purification_rate: Percent,
    pub purification_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioOutput {
    pub total_value: Money,
    pub total_cost: Money,
    pub total_gain: Money,
    pub total_gain_percent: Percent,
    pub total_annual_dividends: Money,
    pub total_purification_annual: Money,
    pub positions: Vec<PositionValuation>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn purification_rate(asset_type: AssetType, stock_rate: Percent) -> Percent {
    match asset_type {
        AssetType::Stock => stock_rate,
        AssetType::EtfIslamic | AssetType::Sukuk => 0.0,
    }
}

fn validate_position(position: &Position) -> AtharResult<String> {
    let ticker = position.ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(AtharError::invalid("ticker", "must not be empty"));
    }
    require_non_negative("quantity", position.quantity)?;
    require_non_negative("average_price", position.average_price)?;
    if let Some(price) = position.current_price {
        require_non_negative("current_price", price)?;
    }
    require_non_negative("dividend_yield", position.dividend_yield)?;
    Ok(ticker)
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Value each position, its unrealised gain, and the yearly dividend share
/// to give away for purification.
///
/// Dividends are estimated as `current_value * dividend_yield`.
pub fn analyze_portfolio(
    input: &PortfolioInput,
) -> AtharResult<ComputationOutput<PortfolioOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.positions.is_empty() {
        return Err(AtharError::InsufficientData(
            "at least one position is required".into(),
        ));
    }
    require_non_negative("stock_purification_rate", input.stock_purification_rate)?;

    let mut positions = Vec::with_capacity(input.positions.len());
    for position in &input.positions {
        let ticker = validate_position(position)?;

        let priced_at_cost = position.current_price.is_none();
        if priced_at_cost {
            let msg = format!("{ticker}: no current price, valued at average cost");
            warn!(ticker = %ticker, "{msg}");
            warnings.push(msg);
        }
        let current_price = position.current_price.unwrap_or(position.average_price);

        let cost_basis = position.average_price * position.quantity;
        let current_value = current_price * position.quantity;
        let gain = current_value - cost_basis;
        let gain_percent = if cost_basis > 0.0 {
            gain / cost_basis * 100.0
        } else {
            0.0
        };
        let annual_dividends = current_value * position.dividend_yield / 100.0;
        let rate = purification_rate(position.asset_type, input.stock_purification_rate);

        positions.push(PositionValuation {
            ticker,
            asset_type: position.asset_type,
            quantity: position.quantity,
            current_price,
            priced_at_cost,
            cost_basis,
            current_value,
            gain,
            gain_percent,
            annual_dividends,
            purification_rate: rate,
            purification_amount: annual_dividends * rate / 100.0,
        });
    }

    let total_value: f64 = positions.iter().map(|p| p.current_value).sum();
    let total_cost: f64 = positions.iter().map(|p| p.cost_basis).sum();
    let total_gain = total_value - total_cost;
    let total_gain_percent = if total_cost > 0.0 {
        total_gain / total_cost * 100.0
    } else {
        0.0
    };
    let total_annual_dividends: f64 = positions.iter().map(|p| p.annual_dividends).sum();
    let total_purification_annual: f64 =
        positions.iter().map(|p| p.purification_amount).sum();

    debug!(
        positions = positions.len(),
        total_value,
        total_purification_annual,
        "portfolio analysed"
    );

    let output = PortfolioOutput {
        total_value,
        total_cost,
        total_gain,
        total_gain_percent,
        total_annual_dividends,
        total_purification_annual,
        positions,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Position valuation with dividend purification by asset type",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
