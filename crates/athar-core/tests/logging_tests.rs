use std::io;
use std::sync::{Arc, Mutex};

use athar_core::housing::buy_vs_rent::{self, RentVsBuyParameters};
use athar_core::monte_carlo::wealth::{self, MonteCarloParameters};
use athar_core::mortgage::amortization::{self, MortgageParameters};
use athar_core::portfolio::valuation::{self, PortfolioInput, Position};
use tracing_subscriber::fmt::MakeWriter;

// ===========================================================================
// Every envelope warning is also emitted as a `warn!` event
// ===========================================================================

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` under a WARN-level subscriber and return its output and the log.
fn capture<T>(f: impl FnOnce() -> T) -> (T, String) {
    let sink = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    let log = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
    (out, log)
}

fn assert_all_logged(warnings: &[String], log: &str) {
    assert!(!warnings.is_empty(), "scenario should produce warnings");
    for w in warnings {
        assert!(log.contains(w.as_str()), "not logged: {w}\nlog:\n{log}");
    }
}

#[test]
fn test_buy_vs_rent_warnings_logged() {
    let params = RentVsBuyParameters {
        down_payment: 10_000.0,
        monthly_rent: 5_000.0,
        ..RentVsBuyParameters::default()
    };
    let (out, log) = capture(|| buy_vs_rent::compare_buy_vs_rent(&params).unwrap());
    // Owner starts below zero and the renter portfolio runs dry
    assert_eq!(out.warnings.len(), 2);
    assert_all_logged(&out.warnings, &log);
}

#[test]
fn test_mortgage_fee_warning_logged() {
    let params = MortgageParameters {
        down_payment: 10_000.0,
        ..MortgageParameters::default()
    };
    let (out, log) = capture(|| amortization::build_mortgage_schedule(&params).unwrap());
    assert_all_logged(&out.warnings, &log);
}

#[test]
fn test_monte_carlo_warnings_logged() {
    // -150% flips the sign every year; 21 years ends below zero
    let params = MonteCarloParameters {
        initial_amount: 5_000.0,
        monthly_contribution: 0.0,
        years: 21,
        annual_return_rate: -150.0,
        volatility_percent: 0.0,
        path_count: 5,
        seed: Some(11),
        ..MonteCarloParameters::default()
    };
    let (out, log) = capture(|| wealth::run_monte_carlo(&params).unwrap());
    // Few paths, negative finals, atypical rate
    assert_eq!(out.warnings.len(), 3);
    assert_all_logged(&out.warnings, &log);
}

#[test]
fn test_portfolio_fallback_price_logged() {
    let input = PortfolioInput {
        positions: vec![Position {
            ticker: "ZZZ".into(),
            quantity: 1.0,
            average_price: 10.0,
            current_price: None,
            dividend_yield: 0.0,
            asset_type: Default::default(),
        }],
        ..PortfolioInput::default()
    };
    let (out, log) = capture(|| valuation::analyze_portfolio(&input).unwrap());
    assert_all_logged(&out.warnings, &log);
}
