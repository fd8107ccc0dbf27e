use serde::{Deserialize, Serialize};

use crate::error::AtharError;
use crate::AtharResult;

/// Monetary amounts. Kept unrounded; rounding is a presentation concern.
pub type Money = f64;

/// Rates expressed in percent (8.0 = 8%), the way the dashboard collects them.
pub type Percent = f64;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Shared validation
// ---------------------------------------------------------------------------

/// Reject NaN and infinities before they can leak into a series.
pub(crate) fn require_finite(field: &str, value: f64) -> AtharResult<()> {
    if !value.is_finite() {
        return Err(AtharError::invalid(field, "must be a finite number"));
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &str, value: f64) -> AtharResult<()> {
    require_finite(field, value)?;
    if value < 0.0 {
        return Err(AtharError::invalid(field, "must be >= 0"));
    }
    Ok(())
}

pub(crate) fn require_positive(field: &str, value: f64) -> AtharResult<()> {
    require_finite(field, value)?;
    if value <= 0.0 {
        return Err(AtharError::invalid(field, "must be > 0"));
    }
    Ok(())
}

/// A monthly growth factor `1 + rate/100/12` must stay strictly positive,
/// otherwise compounding flips sign or collapses to zero.
pub(crate) fn require_monthly_factor(field: &str, annual_rate: Percent) -> AtharResult<()> {
    require_finite(field, annual_rate)?;
    if monthly_factor(annual_rate) <= 0.0 {
        return Err(AtharError::degenerate(
            field,
            "monthly growth factor 1 + rate/1200 must be > 0",
        ));
    }
    Ok(())
}

/// `1 + rate/100/12`
pub(crate) fn monthly_factor(annual_rate: Percent) -> f64 {
    1.0 + annual_rate / 100.0 / 12.0
}

/// Rates outside this band are accepted but flagged.
pub(crate) const TYPICAL_RATE_BAND: (Percent, Percent) = (-50.0, 50.0);

pub(crate) fn flag_atypical_rate(field: &str, rate: Percent, warnings: &mut Vec<String>) {
    if rate < TYPICAL_RATE_BAND.0 || rate > TYPICAL_RATE_BAND.1 {
        let msg = format!(
            "{field} of {rate:.2}% is outside the typical [{}, {}]% range",
            TYPICAL_RATE_BAND.0, TYPICAL_RATE_BAND.1
        );
        tracing::warn!(field, rate, "{msg}");
        warnings.push(msg);
    }
}
