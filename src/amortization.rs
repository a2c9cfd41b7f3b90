//! Fixed-rate annuity loans: the constant payment and its month-by-month split
//! into interest and principal.
//!
//! Everything here is pure. The caller owns the running balance and feeds it
//! back in one month at a time, or asks for the whole schedule at once.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::RateConvention;
use crate::error::{EngineResult, SimulationError};
use crate::types::{Money, Rate};

/// The outcome of a single monthly payment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthPayment {
    /// The portion of the payment labelled as interest.
    pub interest: Money,
    /// The portion of the payment that reduces the balance.
    pub principal: Money,
    /// The remaining balance after the payment. Never negative.
    pub new_balance: Money,
}

impl MonthPayment {
    /// Cash actually handed to the lender this month.
    pub fn amount_paid(&self) -> Money {
        self.interest + self.principal
    }
}

/// A complete repayment schedule for a fixed-payment loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    /// The fixed monthly payment.
    pub payment: Money,
    /// The sum of all amounts actually paid.
    pub total_paid: Money,
    /// The sum of all interest components.
    pub total_interest: Money,
    /// One entry per month, in order.
    pub months: Vec<MonthPayment>,
}

/// Converts an annual rate into the periodic rate applied each month.
///
/// `Nominal` divides by twelve. `Effective` finds the monthly rate that
/// compounds to the annual one: `(1 + annual)^(1/12) - 1`.
pub fn monthly_rate(annual_rate: Rate, convention: RateConvention) -> Rate {
    match convention {
        RateConvention::Nominal => annual_rate / dec!(12),
        RateConvention::Effective => {
            let exponent = Decimal::ONE / dec!(12);
            (Decimal::ONE + annual_rate).powd(exponent) - Decimal::ONE
        }
    }
}

/// Computes the constant payment that clears `principal` in `num_periods`.
///
/// Uses `P * r(1 + r)^n / [(1 + r)^n - 1]`, or `P / n` when the rate is zero.
/// The result keeps full precision; rounding is left to whoever displays it.
///
/// # Errors
///
/// Returns an error if `principal` is not positive, `periodic_rate` is
/// negative, or `num_periods` is zero.
pub fn compute_fixed_payment(
    principal: Money,
    periodic_rate: Rate,
    num_periods: u32,
) -> EngineResult<Money> {
    if principal <= Decimal::ZERO {
        return Err(SimulationError::invalid(
            "principal",
            "must be greater than zero",
        ));
    }
    if periodic_rate < Decimal::ZERO {
        return Err(SimulationError::invalid(
            "periodic_rate",
            format!("must not be negative, got {periodic_rate}"),
        ));
    }
    if num_periods == 0 {
        return Err(SimulationError::invalid(
            "num_periods",
            "must be greater than zero",
        ));
    }

    if periodic_rate.is_zero() {
        return Ok(principal / Decimal::from(num_periods));
    }

    let growth = (Decimal::ONE + periodic_rate)
        .checked_powu(num_periods.into())
        .ok_or_else(|| SimulationError::overflow("annuity growth factor"))?;
    // Keep the ratio close to the rate before scaling by the principal.
    let factor = periodic_rate * growth / (growth - Decimal::ONE);
    Ok(principal * factor)
}

/// Applies one monthly payment to `outstanding`.
///
/// Interest is `outstanding * periodic_rate * interest_fraction` and the rest
/// of the payment is principal. Principal is clamped to the balance, so the
/// month that clears the loan pays less than `payment`, and a cleared loan
/// pays nothing.
pub fn amortize_one_month(
    outstanding: Money,
    periodic_rate: Rate,
    payment: Money,
    interest_fraction: Rate,
) -> MonthPayment {
    if outstanding <= Decimal::ZERO {
        return MonthPayment {
            interest: Decimal::ZERO,
            principal: Decimal::ZERO,
            new_balance: Decimal::ZERO,
        };
    }

    let interest = outstanding * periodic_rate * interest_fraction;
    let principal = (payment - interest).max(Decimal::ZERO).min(outstanding);

    MonthPayment {
        interest,
        principal,
        new_balance: (outstanding - principal).max(Decimal::ZERO),
    }
}

/// Builds the full schedule of a fixed-payment loan.
///
/// # Errors
///
/// Same conditions as [`compute_fixed_payment`], plus an `interest_fraction`
/// outside `[0, 1]`.
pub fn amortization_schedule(
    principal: Money,
    periodic_rate: Rate,
    num_periods: u32,
    interest_fraction: Rate,
) -> EngineResult<AmortizationSchedule> {
    if interest_fraction < Decimal::ZERO || interest_fraction > Decimal::ONE {
        return Err(SimulationError::invalid(
            "interest_fraction",
            format!("must be between 0 and 1, got {interest_fraction}"),
        ));
    }

    let payment = compute_fixed_payment(principal, periodic_rate, num_periods)?;

    let mut balance = principal;
    let mut total_paid = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;
    let mut months = Vec::with_capacity(num_periods as usize);

    for _ in 0..num_periods {
        let month = amortize_one_month(balance, periodic_rate, payment, interest_fraction);
        balance = month.new_balance;
        total_paid += month.amount_paid();
        total_interest += month.interest;
        months.push(month);
    }

    Ok(AmortizationSchedule {
        payment,
        total_paid,
        total_interest,
        months,
    })
}
