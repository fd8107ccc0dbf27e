use athar_core::monte_carlo::wealth::{self, MonteCarloParameters};
use athar_core::random::normal::{RngUniform, ScriptedUniform};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

// ===========================================================================
// Monte Carlo wealth simulation
// ===========================================================================

fn params(seed: u64) -> MonteCarloParameters {
    MonteCarloParameters {
        seed: Some(seed),
        ..MonteCarloParameters::default()
    }
}

#[test]
fn test_run_is_reproducible_with_seed() {
    let a = wealth::run_monte_carlo(&params(7)).unwrap();
    let b = wealth::run_monte_carlo(&params(7)).unwrap();
    assert_eq!(a.result, b.result);
}

#[test]
fn test_different_seeds_differ() {
    let a = wealth::run_monte_carlo(&params(1)).unwrap();
    let b = wealth::run_monte_carlo(&params(2)).unwrap();
    assert_ne!(a.result.summary.median, b.result.summary.median);
}

#[test]
fn test_zero_volatility_every_path_is_expected_path() {
    let p = MonteCarloParameters {
        volatility_percent: 0.0,
        ..params(3)
    };
    let out = wealth::run_monte_carlo(&p).unwrap();
    for path in &out.result.paths {
        assert_eq!(path, &out.result.expected_path);
    }
}

#[test]
fn test_zero_volatility_ignores_the_source() {
    let p = MonteCarloParameters {
        volatility_percent: 0.0,
        path_count: 10,
        ..params(3)
    };
    let scripted = wealth::simulate(&p, ScriptedUniform::new(vec![0.9, 0.1, 0.3])).unwrap();
    let seeded = wealth::simulate(&p, RngUniform::seeded(99)).unwrap();
    assert_eq!(scripted, seeded);
}

#[test]
fn test_median_near_expected_path() {
    let p = MonteCarloParameters {
        path_count: 2_000,
        volatility_percent: 5.0,
        ..params(11)
    };
    let r = wealth::simulate(&p, RngUniform::seeded(11)).unwrap();
    let expected = wealth::deterministic_path(&p).unwrap().final_balance();
    let rel = (r.summary.median - expected).abs() / expected;
    assert!(rel < 0.05, "median={} expected={}", r.summary.median, expected);
}

#[test]
fn test_parallel_and_serial_agree_on_shape() {
    let p = params(5);
    let serial = wealth::simulate(&p, RngUniform::seeded(5)).unwrap();
    let parallel = wealth::simulate_parallel(&p, 5).unwrap();
    assert_eq!(serial.paths.len(), parallel.paths.len());
    assert!(parallel.summary.p10 <= parallel.summary.median);
    assert!(parallel.summary.median <= parallel.summary.p90);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_percentiles_ordered(
        seed in any::<u64>(),
        path_count in 10u32..300,
        years in 1u32..=30,
        rate in -10.0f64..15.0,
        vol in 0.0f64..40.0,
    ) {
        let p = MonteCarloParameters {
            years,
            annual_return_rate: rate,
            volatility_percent: vol,
            path_count,
            seed: Some(seed),
            ..MonteCarloParameters::default()
        };
        let r = wealth::simulate(&p, RngUniform::seeded(seed)).unwrap();
        prop_assert_eq!(r.paths.len(), path_count as usize);
        prop_assert!(r.summary.p10 <= r.summary.median);
        prop_assert!(r.summary.median <= r.summary.p90);
    }
}
