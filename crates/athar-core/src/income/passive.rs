use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::AtharError;
use crate::types::{
    require_non_negative, require_positive, with_metadata, ComputationOutput, Money, Percent,
};
use crate::AtharResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A recurring expense the investment income should cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifestyleGoal {
    pub label: String,
    pub monthly_cost: Money,
}

impl LifestyleGoal {
    fn new(label: &str, monthly_cost: Money) -> Self {
        Self {
            label: label.to_string(),
            monthly_cost,
        }
    }
}

/// The dashboard's goal ladder, cheapest first.
pub fn default_goals() -> Vec<LifestyleGoal> {
    vec![
        LifestyleGoal::new("Streaming", 15.0),
        LifestyleGoal::new("Gym", 35.0),
        LifestyleGoal::new("Internet", 60.0),
        LifestyleGoal::new("Shopping", 150.0),
        LifestyleGoal::new("Car lease", 400.0),
        LifestyleGoal::new("Rent or mortgage", 900.0),
        LifestyleGoal::new("Travel", 1_500.0),
        LifestyleGoal::new("Financial freedom", 3_000.0),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassiveIncomeInput {
    pub capital: Money,
    /// Annual distribution yield.
    pub yield_rate: Percent,
    pub goals: Vec<LifestyleGoal>,
}

impl Default for PassiveIncomeInput {
    fn default() -> Self {
        Self {
            capital: 10_000.0,
            yield_rate: 5.0,
            goals: default_goals(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalCoverage {
    pub label: String,
    pub monthly_cost: Money,
    /// Whole percent, capped at 100.
    pub coverage_percent: u32,
    pub unlocked: bool,
    pub capital_required: Money,
    pub capital_shortfall: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassiveIncomeOutput {
    pub annual_income: Money,
    pub monthly_income: Money,
    pub goals_unlocked: u32,
    pub goals: Vec<GoalCoverage>,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Income a capital base throws off at a given yield, and how far it goes
/// towards each goal.
pub fn compute_passive_income(
    input: &PassiveIncomeInput,
) -> AtharResult<ComputationOutput<PassiveIncomeOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    require_non_negative("capital", input.capital)?;
    require_positive("yield_rate", input.yield_rate)?;
    for goal in &input.goals {
        if !(goal.monthly_cost.is_finite() && goal.monthly_cost > 0.0) {
            return Err(AtharError::InvalidInput {
                field: format!("goals[{}].monthly_cost", goal.label),
                reason: "must be > 0".into(),
            });
        }
    }

    let annual_income = input.capital * input.yield_rate / 100.0;
    let monthly_income = annual_income / 12.0;

    let goals: Vec<GoalCoverage> = input
        .goals
        .iter()
        .map(|goal| {
            let ratio = (monthly_income / goal.monthly_cost * 100.0).round();
            let coverage_percent = ratio.min(100.0) as u32;
            let capital_required = goal.monthly_cost * 12.0 / (input.yield_rate / 100.0);
            GoalCoverage {
                label: goal.label.clone(),
                monthly_cost: goal.monthly_cost,
                coverage_percent,
                unlocked: coverage_percent >= 100,
                capital_required,
                capital_shortfall: (capital_required - input.capital).max(0.0),
            }
        })
        .collect();
    let goals_unlocked = goals.iter().filter(|g| g.unlocked).count() as u32;

    debug!(annual_income, goals_unlocked, "passive income computed");

    let output = PassiveIncomeOutput {
        annual_income,
        monthly_income,
        goals_unlocked,
        goals,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Yield-based passive income against lifestyle goals",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_income() {
        let out = compute_passive_income(&PassiveIncomeInput::default()).unwrap();
        let r = &out.result;
        assert_eq!(r.annual_income, 500.0);
        assert!((r.monthly_income - 41.666_666).abs() < 1e-5);
        // 41.67/month covers streaming (15) and gym (35)
        assert_eq!(r.goals_unlocked, 2);
        assert_eq!(r.goals[2].coverage_percent, 69);
    }

    #[test]
    fn test_capital_required() {
        let out = compute_passive_income(&PassiveIncomeInput::default()).unwrap();
        let rent = out.result.goals.iter().find(|g| g.monthly_cost == 900.0).unwrap();
        // 900 * 12 / 5% = 216k
        assert!((rent.capital_required - 216_000.0).abs() < 1e-6);
        assert!((rent.capital_shortfall - 206_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_coverage_capped() {
        let input = PassiveIncomeInput {
            capital: 10_000_000.0,
            ..PassiveIncomeInput::default()
        };
        let out = compute_passive_income(&input).unwrap();
        assert!(out.result.goals.iter().all(|g| g.coverage_percent == 100 && g.unlocked));
        assert!(out.result.goals.iter().all(|g| g.capital_shortfall == 0.0));
    }

    #[test]
    fn test_zero_yield_rejected() {
        let input = PassiveIncomeInput {
            yield_rate: 0.0,
            ..PassiveIncomeInput::default()
        };
        assert!(compute_passive_income(&input).is_err());
    }

    #[test]
    fn test_zero_cost_goal_rejected() {
        let input = PassiveIncomeInput {
            goals: vec![LifestyleGoal::new("Free", 0.0)],
            ..PassiveIncomeInput::default()
        };
        assert!(compute_passive_income(&input).is_err());
    }
}
