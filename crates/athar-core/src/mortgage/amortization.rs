use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::AtharError;
use crate::types::{
    require_finite, require_non_negative, require_positive, with_metadata, ComputationOutput,
    Money, Percent,
};
use crate::AtharResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Notary and registration fees as a share of the price, for an older property.
pub const DEFAULT_NOTARY_FEE_RATE: Percent = 8.0;

/// Residual principal below this is treated as fully repaid.
pub const PRINCIPAL_TOLERANCE: Money = 0.01;

/// Longest loan term accepted, in years.
pub const MAX_TERM_YEARS: u32 = 100;

/// Purchase financed with a fixed-rate mortgage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MortgageParameters {
    pub property_price: Money,
    pub down_payment: Money,
    pub years: u32,
    pub annual_rate: Percent,
    pub notary_fee_rate: Percent,
}

impl Default for MortgageParameters {
    fn default() -> Self {
        Self {
            property_price: 250_000.0,
            down_payment: 30_000.0,
            years: 25,
            annual_rate: 3.8,
            notary_fee_rate: DEFAULT_NOTARY_FEE_RATE,
        }
    }
}

impl MortgageParameters {
    pub fn notary_fees(&self) -> Money {
        self.property_price * self.notary_fee_rate / 100.0
    }

    /// `price + notary fees - down payment`, which must not be negative.
    pub fn loan_amount(&self) -> AtharResult<Money> {
        require_positive("property_price", self.property_price)?;
        require_non_negative("down_payment", self.down_payment)?;
        require_non_negative("notary_fee_rate", self.notary_fee_rate)?;
        let loan = self.property_price + self.notary_fees() - self.down_payment;
        if loan < 0.0 {
            return Err(AtharError::invalid(
                "down_payment",
                "down payment exceeds price plus notary fees",
            ));
        }
        Ok(loan)
    }
}

/// Loan position after one monthly payment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmortizationState {
    pub month: u32,
    pub monthly_payment: Money,
    pub interest: Money,
    pub principal_paid: Money,
    pub remaining_principal: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearEndBalance {
    pub year: u32,
    pub remaining_principal: Money,
    pub interest_paid: Money,
    pub principal_paid: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageOutput {
    pub notary_fees: Money,
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub total_paid: Money,
    pub total_interest: Money,
    pub overpaid: bool,
    pub yearly_balances: Vec<YearEndBalance>,
    pub schedule: Vec<AmortizationState>,
}

// ---------------------------------------------------------------------------
// Payment
// ---------------------------------------------------------------------------

fn validate_loan(loan_amount: Money, annual_rate: Percent, years: u32) -> AtharResult<()> {
    require_finite("loan_amount", loan_amount)?;
    if loan_amount < 0.0 {
        return Err(AtharError::invalid(
            "loan_amount",
            "must be >= 0 (down payment and fees exceed the price)",
        ));
    }
    require_finite("annual_rate", annual_rate)?;
    if annual_rate < 0.0 {
        return Err(AtharError::invalid("annual_rate", "must be >= 0"));
    }
    if years == 0 || years > MAX_TERM_YEARS {
        return Err(AtharError::invalid(
            "years",
            format!("must be between 1 and {MAX_TERM_YEARS}"),
        ));
    }
    Ok(())
}

/// Fixed annuity payment `P r / (1 - (1 + r)^-n)` with `r` the monthly rate.
///
/// A zero rate repays straight-line (`P / n`). The denominator goes through
/// `ln_1p`/`exp_m1`, so near-zero rates converge on `P / n` smoothly.
pub fn compute_monthly_payment(
    loan_amount: Money,
    annual_rate: Percent,
    years: u32,
) -> AtharResult<Money> {
    validate_loan(loan_amount, annual_rate, years)?;

    let n = years * 12;
    let r = annual_rate / 100.0 / 12.0;
    if r == 0.0 {
        return Ok(loan_amount / n as f64);
    }

    // 1 - (1 + r)^-n, kept accurate for tiny r where 1 + r would round.
    let denominator = -(-(n as f64) * r.ln_1p()).exp_m1();
    if denominator <= 0.0 || !denominator.is_finite() {
        return Err(AtharError::degenerate(
            "annual_rate",
            format!("annuity denominator {denominator} at monthly rate {r}"),
        ));
    }
    let payment = loan_amount * r / denominator;
    if !payment.is_finite() {
        return Err(AtharError::DivisionByZero {
            context: "mortgage payment".into(),
        });
    }
    Ok(payment)
}

// ---------------------------------------------------------------------------
// Amortizer
// ---------------------------------------------------------------------------

/// Steps a fixed-rate loan forward one month at a time.
#[derive(Debug, Clone)]
pub struct Amortizer {
    monthly_rate: f64,
    monthly_payment: Money,
    remaining_principal: Money,
    months_elapsed: u32,
    total_months: u32,
    overpaid: bool,
}

impl Amortizer {
    pub fn new(loan_amount: Money, annual_rate: Percent, years: u32) -> AtharResult<Self> {
        let monthly_payment = compute_monthly_payment(loan_amount, annual_rate, years)?;
        Ok(Self {
            monthly_rate: annual_rate / 100.0 / 12.0,
            monthly_payment,
            remaining_principal: loan_amount,
            months_elapsed: 0,
            total_months: years * 12,
            overpaid: false,
        })
    }

    /// Same loan repaid with a fixed payment of the caller's choosing, e.g. the
    /// annuity rounded up to whole units. A payment above the annuity clears
    /// the loan early and the excess is clamped away.
    pub fn with_payment(
        loan_amount: Money,
        annual_rate: Percent,
        years: u32,
        monthly_payment: Money,
    ) -> AtharResult<Self> {
        let annuity = compute_monthly_payment(loan_amount, annual_rate, years)?;
        require_finite("monthly_payment", monthly_payment)?;
        if monthly_payment < annuity {
            return Err(AtharError::invalid(
                "monthly_payment",
                format!("must cover the annuity of {annuity:.2}"),
            ));
        }
        let mut amortizer = Self::new(loan_amount, annual_rate, years)?;
        amortizer.monthly_payment = monthly_payment;
        Ok(amortizer)
    }

    pub fn monthly_payment(&self) -> Money {
        self.monthly_payment
    }

    pub fn remaining_principal(&self) -> Money {
        self.remaining_principal
    }

    pub fn is_finished(&self) -> bool {
        self.months_elapsed >= self.total_months
    }

    /// True once a payment overshot the balance by more than
    /// `PRINCIPAL_TOLERANCE`. Smaller residue is clamped silently.
    pub fn overpaid(&self) -> bool {
        self.overpaid
    }

    /// Accrue one month of interest, then apply the payment.
    ///
    /// Once the term is over the loan no longer moves and the state repeats
    /// with zero payment.
    pub fn step(&mut self) -> AmortizationState {
        if self.is_finished() {
            return AmortizationState {
                month: self.months_elapsed,
                monthly_payment: 0.0,
                interest: 0.0,
                principal_paid: 0.0,
                remaining_principal: self.remaining_principal,
            };
        }

        let interest = self.remaining_principal * self.monthly_rate;
        let mut principal_paid = self.monthly_payment - interest;
        self.remaining_principal -= principal_paid;
        if self.remaining_principal < 0.0 {
            if -self.remaining_principal > PRINCIPAL_TOLERANCE {
                self.overpaid = true;
            }
            principal_paid += self.remaining_principal;
            self.remaining_principal = 0.0;
        }
        self.months_elapsed += 1;

        AmortizationState {
            month: self.months_elapsed,
            monthly_payment: self.monthly_payment,
            interest,
            principal_paid,
            remaining_principal: self.remaining_principal,
        }
    }
}

/// Full monthly schedule of `years * 12` payments.
pub fn amortize(
    loan_amount: Money,
    annual_rate: Percent,
    years: u32,
) -> AtharResult<Vec<AmortizationState>> {
    let mut amortizer = Amortizer::new(loan_amount, annual_rate, years)?;
    let mut schedule = Vec::with_capacity((years * 12) as usize);
    while !amortizer.is_finished() {
        schedule.push(amortizer.step());
    }
    Ok(schedule)
}

/// Build the complete schedule for a purchase, fees included.
pub fn build_mortgage_schedule(
    input: &MortgageParameters,
) -> AtharResult<ComputationOutput<MortgageOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let notary_fees = input.notary_fees();
    let loan_amount = input.loan_amount()?;

    let mut amortizer = Amortizer::new(loan_amount, input.annual_rate, input.years)?;
    let monthly_payment = amortizer.monthly_payment();

    let mut schedule = Vec::with_capacity((input.years * 12) as usize);
    let mut yearly_balances = Vec::with_capacity(input.years as usize);
    let mut total_paid = 0.0;
    let mut total_interest = 0.0;

    for year in 1..=input.years {
        let mut interest_paid = 0.0;
        let mut principal_paid = 0.0;
        for _ in 0..12 {
            let state = amortizer.step();
            interest_paid += state.interest;
            principal_paid += state.principal_paid;
            total_paid += state.interest + state.principal_paid;
            schedule.push(state);
        }
        total_interest += interest_paid;
        yearly_balances.push(YearEndBalance {
            year,
            remaining_principal: amortizer.remaining_principal(),
            interest_paid,
            principal_paid,
        });
    }

    if amortizer.overpaid() {
        let msg =
            "Final payment exceeded the outstanding principal; balance clamped at zero".to_string();
        warn!("{msg}");
        warnings.push(msg);
    }
    if input.down_payment < notary_fees {
        let msg = format!(
            "Down payment of {:.2} does not cover notary fees of {notary_fees:.2}",
            input.down_payment
        );
        warn!("{msg}");
        warnings.push(msg);
    }

    debug!(
        loan_amount,
        monthly_payment,
        total_interest,
        "mortgage schedule built"
    );

    let output = MortgageOutput {
        notary_fees,
        loan_amount,
        monthly_payment,
        total_paid,
        total_interest,
        overpaid: amortizer.overpaid(),
        yearly_balances,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-rate annuity amortisation",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
