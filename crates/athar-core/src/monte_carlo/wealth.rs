use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::AtharError;
use crate::random::normal::{NormalGenerator, RngUniform, UniformSource};
use crate::types::{
    flag_atypical_rate, require_finite, require_non_negative, with_metadata, ComputationOutput,
    Money, Percent,
};
use crate::AtharResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

pub const DEFAULT_PATH_COUNT: u32 = 50;

/// Upper bound on paths per run; the dashboard draws every one of them.
pub const MAX_PATH_COUNT: u32 = 100_000;

pub const MAX_YEARS: u32 = 100;

/// Parameters for a stochastic wealth simulation with yearly steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloParameters {
    pub initial_amount: Money,
    pub monthly_contribution: Money,
    pub years: u32,
    /// Mean annual return.
    pub annual_return_rate: Percent,
    /// Only used to deflate the median in the summary.
    pub annual_inflation_rate: Percent,
    /// Standard deviation of the annual return.
    pub volatility_percent: Percent,
    pub path_count: u32,
    /// Seed for reproducible runs; entropy when absent.
    pub seed: Option<u64>,
    /// Spread the paths over the rayon pool. Reproducible for a given seed,
    /// but not identical to a sequential run with the same seed.
    pub parallel: bool,
}

impl Default for MonteCarloParameters {
    fn default() -> Self {
        Self {
            initial_amount: 5_000.0,
            monthly_contribution: 500.0,
            years: 20,
            annual_return_rate: 8.0,
            annual_inflation_rate: 2.0,
            volatility_percent: 15.0,
            path_count: DEFAULT_PATH_COUNT,
            seed: None,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub year: u32,
    pub balance: Money,
}

/// One stochastic trajectory, one point per year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationPath {
    pub points: Vec<PathPoint>,
}

impl SimulationPath {
    pub fn final_balance(&self) -> Money {
        self.points.last().map(|p| p.balance).unwrap_or(0.0)
    }
}

/// Distribution of final balances across all paths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    /// Pessimistic outcome (10th percentile).
    pub p10: Money,
    pub median: Money,
    /// Optimistic outcome (90th percentile).
    pub p90: Money,
    pub mean: Money,
    pub std_dev: Money,
    pub min: Money,
    pub max: Money,
    /// Median in today's money.
    pub real_median: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub paths: Vec<SimulationPath>,
    pub summary: MonteCarloSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloOutput {
    pub path_count: u32,
    pub paths: Vec<SimulationPath>,
    /// The trajectory every path would follow at zero volatility.
    pub expected_path: SimulationPath,
    pub summary: MonteCarloSummary,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(params: &MonteCarloParameters) -> AtharResult<()> {
    if params.years == 0 || params.years > MAX_YEARS {
        return Err(AtharError::invalid(
            "years",
            format!("must be between 1 and {MAX_YEARS}"),
        ));
    }
    if params.path_count == 0 || params.path_count > MAX_PATH_COUNT {
        return Err(AtharError::invalid(
            "path_count",
            format!("must be between 1 and {MAX_PATH_COUNT}"),
        ));
    }
    require_non_negative("initial_amount", params.initial_amount)?;
    require_non_negative("monthly_contribution", params.monthly_contribution)?;
    require_finite("annual_return_rate", params.annual_return_rate)?;
    require_non_negative("volatility_percent", params.volatility_percent)?;
    require_finite("annual_inflation_rate", params.annual_inflation_rate)?;
    if params.annual_inflation_rate <= -100.0 {
        return Err(AtharError::degenerate(
            "annual_inflation_rate",
            "must be > -100%",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Path generation
// ---------------------------------------------------------------------------

/// Walk one path: each year draws a normal shock, applies the perturbed
/// return, then adds twelve months of contributions.
fn walk_path<U: UniformSource>(
    params: &MonteCarloParameters,
    normals: &mut NormalGenerator<U>,
) -> SimulationPath {
    let mean = params.annual_return_rate / 100.0;
    let vol = params.volatility_percent / 100.0;
    let yearly_contribution = params.monthly_contribution * 12.0;

    let mut balance = params.initial_amount;
    let mut points = Vec::with_capacity(params.years as usize);
    for year in 1..=params.years {
        let z = normals.next_standard_normal();
        let annual_return = mean + vol * z;
        balance *= 1.0 + annual_return;
        balance += yearly_contribution;
        points.push(PathPoint { year, balance });
    }
    SimulationPath { points }
}

/// The zero-volatility trajectory, using the same arithmetic as `walk_path`.
pub fn deterministic_path(params: &MonteCarloParameters) -> AtharResult<SimulationPath> {
    validate(params)?;
    let mean = params.annual_return_rate / 100.0;
    let yearly_contribution = params.monthly_contribution * 12.0;

    let mut balance = params.initial_amount;
    let mut points = Vec::with_capacity(params.years as usize);
    for year in 1..=params.years {
        balance *= 1.0 + mean;
        balance += yearly_contribution;
        points.push(PathPoint { year, balance });
    }
    Ok(SimulationPath { points })
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Index of the pessimistic/optimistic tail: `floor(0.1 * n)`.
pub fn tail_index(path_count: usize) -> usize {
    path_count / 10
}

/// Summarise final balances. Percentiles are read at fixed indices of the
/// ascending sort: `n/10`, `n/2` and `n - 1 - n/10`.
pub fn summarize(
    paths: &[SimulationPath],
    params: &MonteCarloParameters,
) -> AtharResult<MonteCarloSummary> {
    if paths.is_empty() {
        return Err(AtharError::InsufficientData(
            "no simulation paths to summarise".into(),
        ));
    }

    let mut finals: Vec<f64> = paths.iter().map(SimulationPath::final_balance).collect();
    finals.sort_by(|a, b| a.total_cmp(b));

    let n = finals.len();
    let tail = tail_index(n);
    let median = finals[n / 2];
    let deflator = (1.0 + params.annual_inflation_rate / 100.0).powi(params.years as i32);

    let std_dev = if n > 1 { finals.iter().std_dev() } else { 0.0 };

    Ok(MonteCarloSummary {
        p10: finals[tail],
        median,
        p90: finals[n - 1 - tail],
        mean: finals.iter().mean(),
        std_dev,
        min: finals[0],
        max: finals[n - 1],
        real_median: median / deflator,
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run `path_count` independent paths drawing from the injected source.
///
/// Paths are generated in order from the single source, so the same source
/// state always reproduces the same result bit for bit.
pub fn simulate<U: UniformSource>(
    params: &MonteCarloParameters,
    source: U,
) -> AtharResult<MonteCarloResult> {
    validate(params)?;

    let mut normals = NormalGenerator::new(source);
    let paths: Vec<SimulationPath> = (0..params.path_count)
        .map(|_| walk_path(params, &mut normals))
        .collect();
    let summary = summarize(&paths, params)?;

    Ok(MonteCarloResult { paths, summary })
}

/// Run the paths on the rayon pool. Path `i` draws from stream `i` of a
/// ChaCha8 generator seeded with `seed`, so the result does not depend on
/// scheduling.
pub fn simulate_parallel(
    params: &MonteCarloParameters,
    seed: u64,
) -> AtharResult<MonteCarloResult> {
    validate(params)?;

    let paths: Vec<SimulationPath> = (0..params.path_count)
        .into_par_iter()
        .map(|i| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(u64::from(i));
            let mut normals = NormalGenerator::new(RngUniform::new(rng));
            walk_path(params, &mut normals)
        })
        .collect();
    let summary = summarize(&paths, params)?;

    Ok(MonteCarloResult { paths, summary })
}

/// Run a Monte Carlo wealth simulation seeded from `input.seed` (or entropy),
/// sequentially or on the rayon pool, and wrap it in the output envelope.
pub fn run_monte_carlo(
    input: &MonteCarloParameters,
) -> AtharResult<ComputationOutput<MonteCarloOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = if input.parallel {
        simulate_parallel(input, input.seed.unwrap_or_else(rand::random::<u64>))?
    } else {
        let source = match input.seed {
            Some(s) => RngUniform::seeded(s),
            None => RngUniform::from_entropy(),
        };
        simulate(input, source)?
    };
    let expected_path = deterministic_path(input)?;

    if input.path_count < 10 {
        let msg = format!(
            "Only {} paths: p10 and p90 collapse onto the extremes",
            input.path_count
        );
        warn!(paths = input.path_count, "{msg}");
        warnings.push(msg);
    }
    let negative = result
        .paths
        .iter()
        .filter(|p| p.final_balance() < 0.0)
        .count();
    if negative > 0 {
        let msg = format!(
            "{negative} of {} paths end with a negative balance",
            input.path_count
        );
        warn!(negative, "{msg}");
        warnings.push(msg);
    }
    flag_atypical_rate("annual_return_rate", input.annual_return_rate, &mut warnings);

    debug!(
        paths = input.path_count,
        parallel = input.parallel,
        years = input.years,
        p10 = result.summary.p10,
        median = result.summary.median,
        p90 = result.summary.p90,
        "monte carlo wealth simulated"
    );

    let output = MonteCarloOutput {
        path_count: input.path_count,
        paths: result.paths,
        expected_path,
        summary: result.summary,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monte Carlo wealth simulation (Box-Muller normal annual returns)",
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
    use crate::random::normal::ScriptedUniform;

    const SEED: u64 = 42;

    fn seeded_params() -> MonteCarloParameters {
        MonteCarloParameters {
            seed: Some(SEED),
            ..MonteCarloParameters::default()
        }
    }

    #[test]
    fn test_path_shape() {
        let r = simulate(&seeded_params(), RngUniform::seeded(SEED)).unwrap();
        assert_eq!(r.paths.len(), 50);
        for path in &r.paths {
            assert_eq!(path.points.len(), 20);
            assert_eq!(path.points[0].year, 1);
            assert_eq!(path.points[19].year, 20);
        }
    }

    #[test]
    fn test_percentile_ordering() {
        let r = simulate(&seeded_params(), RngUniform::seeded(SEED)).unwrap();
        let s = r.summary;
        assert!(s.min <= s.p10);
        assert!(s.p10 <= s.median);
        assert!(s.median <= s.p90);
        assert!(s.p90 <= s.max);
    }

    #[test]
    fn test_percentile_indices_for_fifty_paths() {
        // 50 paths: indices 5, 25 and 44
        assert_eq!(tail_index(50), 5);
        let params = MonteCarloParameters {
            years: 1,
            initial_amount: 0.0,
            monthly_contribution: 0.0,
            ..seeded_params()
        };
        let paths: Vec<SimulationPath> = (0..50)
            .rev()
            .map(|i| SimulationPath {
                points: vec![PathPoint {
                    year: 1,
                    balance: i as f64,
                }],
            })
            .collect();
        let s = summarize(&paths, &params).unwrap();
        assert_eq!(s.p10, 5.0);
        assert_eq!(s.median, 25.0);
        assert_eq!(s.p90, 44.0);
        assert_eq!(s.min, 0.0);
        assert_eq!(s.max, 49.0);
    }

    #[test]
    fn test_zero_volatility_matches_deterministic() {
        let params = MonteCarloParameters {
            volatility_percent: 0.0,
            ..seeded_params()
        };
        let r = simulate(&params, RngUniform::seeded(SEED)).unwrap();
        let expected = deterministic_path(&params).unwrap();
        for path in &r.paths {
            assert_eq!(path, &expected);
        }
        assert_eq!(r.summary.p10, r.summary.p90);
        assert!(r.summary.std_dev.abs() < 1e-3, "std_dev={}", r.summary.std_dev);
    }

    #[test]
    fn test_deterministic_path_closed_form() {
        let params = MonteCarloParameters {
            initial_amount: 1000.0,
            monthly_contribution: 100.0,
            years: 2,
            annual_return_rate: 10.0,
            volatility_percent: 0.0,
            ..MonteCarloParameters::default()
        };
        let path = deterministic_path(&params).unwrap();
        // y1: 1000*1.1 + 1200 = 2300; y2: 2300*1.1 + 1200 = 3730
        assert!((path.points[0].balance - 2300.0).abs() < 1e-9);
        assert!((path.points[1].balance - 3730.0).abs() < 1e-9);
    }

    #[test]
    fn test_scripted_source_drives_returns() {
        // u = e^-0.5, v = 0 -> z = 1 every year
        let u = (-0.5_f64).exp();
        let params = MonteCarloParameters {
            initial_amount: 1000.0,
            monthly_contribution: 0.0,
            years: 1,
            annual_return_rate: 5.0,
            volatility_percent: 10.0,
            path_count: 1,
            ..MonteCarloParameters::default()
        };
        let r = simulate(&params, ScriptedUniform::new(vec![u, 0.0])).unwrap();
        // return = 5% + 10% * 1 = 15%
        assert!((r.paths[0].final_balance() - 1150.0).abs() < 1e-9);
    }

    #[test]
    fn test_seeded_reproducibility() {
        let a = simulate(&seeded_params(), RngUniform::seeded(SEED)).unwrap();
        let b = simulate(&seeded_params(), RngUniform::seeded(SEED)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parallel_reproducible() {
        let a = simulate_parallel(&seeded_params(), SEED).unwrap();
        let b = simulate_parallel(&seeded_params(), SEED).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.paths.len(), 50);
    }

    #[test]
    fn test_parallel_paths_differ() {
        let r = simulate_parallel(&seeded_params(), SEED).unwrap();
        assert_ne!(r.paths[0], r.paths[1]);
    }

    #[test]
    fn test_real_median_deflated() {
        let params = MonteCarloParameters {
            volatility_percent: 0.0,
            annual_inflation_rate: 0.0,
            ..seeded_params()
        };
        let r = simulate(&params, RngUniform::seeded(SEED)).unwrap();
        assert_eq!(r.summary.real_median, r.summary.median);
    }

    #[test]
    fn test_validation() {
        let zero_paths = MonteCarloParameters {
            path_count: 0,
            ..seeded_params()
        };
        assert!(simulate(&zero_paths, RngUniform::seeded(SEED)).is_err());

        let zero_years = MonteCarloParameters {
            years: 0,
            ..seeded_params()
        };
        assert!(simulate(&zero_years, RngUniform::seeded(SEED)).is_err());

        let negative_vol = MonteCarloParameters {
            volatility_percent: -5.0,
            ..seeded_params()
        };
        assert!(simulate(&negative_vol, RngUniform::seeded(SEED)).is_err());
    }

    #[test]
    fn test_run_monte_carlo_envelope() {
        let out = run_monte_carlo(&seeded_params()).unwrap();
        assert_eq!(out.result.path_count, 50);
        assert_eq!(out.result.expected_path.points.len(), 20);
        assert_eq!(out.metadata.precision, "ieee754_f64");
    }

    #[test]
    fn test_run_parallel_uses_streams() {
        let params = MonteCarloParameters {
            parallel: true,
            ..seeded_params()
        };
        let out = run_monte_carlo(&params).unwrap();
        let direct = simulate_parallel(&params, SEED).unwrap();
        assert_eq!(out.result.paths, direct.paths);
        assert_eq!(out.result.summary, direct.summary);
    }

    #[test]
    fn test_few_paths_warns() {
        let params = MonteCarloParameters {
            path_count: 5,
            ..seeded_params()
        };
        let out = run_monte_carlo(&params).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("paths")));
    }
}
