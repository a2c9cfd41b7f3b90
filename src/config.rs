//! Input configuration for a buy-versus-rent run.
//!
//! The configuration is built once by the caller (from a JSON file, a form, or
//! code) and is read-only for the duration of a run. Every group has defaults,
//! so a partial JSON document deserializes into a complete configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{EngineResult, SimulationError};
use crate::types::{Money, Rate};

/// Longest loan tenure or holding period accepted, in years.
pub const MAX_HORIZON_YEARS: u32 = 100;

/// Complete input of [`crate::run`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// The home and the holding period.
    pub property: PropertyTerms,
    /// Mortgage terms.
    pub loan: LoanTerms,
    /// Rent and the investment that receives the surplus.
    pub rent: RentTerms,
    /// One-time, recurring and disposal costs.
    pub costs: CostTerms,
    /// Interest deduction and capital gains rules.
    pub tax: TaxTerms,
}

/// The home being bought and how long it is held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyTerms {
    /// Purchase price.
    pub price: Money,
    /// Cash paid upfront. The remainder is borrowed.
    pub down_payment: Money,
    /// Annual appreciation of the property value.
    pub appreciation_rate: Rate,
    /// Number of simulated years before the hypothetical sale.
    pub holding_period_years: u32,
}

/// Fixed-rate mortgage terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanTerms {
    /// Fixed annual interest rate of the mortgage.
    pub annual_interest_rate: Rate,
    /// Term over which the loan is fully repaid.
    pub tenure_years: u32,
    /// Fraction of the standard interest charge reported as interest.
    /// `None` means standard accounting (1.0).
    pub interest_portion_override: Option<Rate>,
    /// How the annual rate is turned into the monthly one.
    pub rate_convention: RateConvention,
}

/// How an annual loan rate becomes a monthly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateConvention {
    /// `annual / 12`.
    #[default]
    Nominal,
    /// `(1 + annual)^(1/12) - 1`.
    Effective,
}

/// The renting alternative and where its surplus is invested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RentTerms {
    /// Rent paid each month of the first year.
    pub initial_monthly_rent: Money,
    /// Yearly increase applied to the rent after each year.
    pub rent_escalation_rate: Rate,
    /// Annual return, compounded monthly at `rate / 12`.
    pub investment_return_rate: Rate,
}

/// Acquisition, holding and disposal costs of the buy track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostTerms {
    /// Charged on the purchase price.
    pub stamp_duty_rate: Rate,
    /// Registration fee paid at purchase.
    pub registration_fee: RegistrationFee,
    /// Processing fee plus loan insurance, charged on the loan amount.
    pub processing_insurance_rate: Rate,
    /// Interior and furnishing spend at purchase.
    pub one_time_interior_cost: Money,
    /// Upkeep for the first year. Escalated yearly afterwards.
    pub annual_upkeep: Money,
    /// Yearly increase applied to upkeep after each year.
    pub upkeep_escalation_rate: Rate,
    /// Charged on the sale value at settlement. Zero disables it.
    pub brokerage_rate_on_sale: Rate,
    /// How costs show up in the yearly buy-track net worth.
    pub recognition: CostRecognition,
}

/// Registration fee as either an amount or a capped share of the price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistrationFee {
    /// A fixed amount.
    Flat { amount: Money },
    /// `price * rate`, limited to `cap`.
    Capped { rate: Rate, cap: Money },
}

impl RegistrationFee {
    pub fn amount_for(&self, price: Money) -> Money {
        match self {
            RegistrationFee::Flat { amount } => *amount,
            RegistrationFee::Capped { rate, cap } => (price * rate).min(*cap),
        }
    }
}

/// When one-time and upkeep costs reduce the buy track's net worth.
///
/// The settlement deducts both exactly once under every variant, so the final
/// net worth is the same; only the yearly series differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostRecognition {
    /// One-time costs in the year-1 record only; cumulative upkeep in every
    /// record.
    #[default]
    Incremental,
    /// One-time costs in every record from year 1 onward, alongside
    /// cumulative upkeep.
    Sunk,
    /// Yearly records show equity only; all costs are deducted at settlement.
    AtSettlement,
}

/// Interest deduction and capital gains rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxTerms {
    /// Marginal income tax rate the interest deduction saves.
    pub tax_bracket: Rate,
    /// Cap on the interest deductible in one year.
    pub max_interest_deduction_per_year: Money,
    /// Rate applied to a positive gain on sale.
    pub capital_gains_tax_rate: Rate,
    /// Acquisition cost the gain is measured against.
    pub cost_basis: CostBasis,
    /// No gains tax once the holding period reaches this many years.
    pub gains_exempt_after_years: Option<u32>,
}

/// Acquisition cost used to measure the taxable gain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CostBasis {
    /// The original purchase price.
    PurchasePrice,
    /// `price * (1 + indexation_rate)^years`.
    Indexed { indexation_rate: Rate },
}

impl Default for PropertyTerms {
    fn default() -> Self {
        Self {
            price: dec!(10_000_000),
            down_payment: dec!(2_000_000),
            appreciation_rate: dec!(0.04),
            holding_period_years: 20,
        }
    }
}

impl Default for LoanTerms {
    fn default() -> Self {
        Self {
            annual_interest_rate: dec!(0.085),
            tenure_years: 20,
            interest_portion_override: None,
            rate_convention: RateConvention::Nominal,
        }
    }
}

impl Default for RentTerms {
    fn default() -> Self {
        Self {
            initial_monthly_rent: dec!(20_000),
            rent_escalation_rate: dec!(0.05),
            investment_return_rate: dec!(0.12),
        }
    }
}

impl Default for CostTerms {
    fn default() -> Self {
        Self {
            stamp_duty_rate: dec!(0.06),
            registration_fee: RegistrationFee::Flat {
                amount: dec!(50_000),
            },
            processing_insurance_rate: dec!(0.005),
            one_time_interior_cost: Decimal::ZERO,
            // maintenance 5,000 + property tax 2,500 per month
            annual_upkeep: dec!(90_000),
            upkeep_escalation_rate: Decimal::ZERO,
            brokerage_rate_on_sale: Decimal::ZERO,
            recognition: CostRecognition::Incremental,
        }
    }
}

impl Default for TaxTerms {
    fn default() -> Self {
        Self {
            tax_bracket: dec!(0.30),
            max_interest_deduction_per_year: dec!(200_000),
            capital_gains_tax_rate: dec!(0.20),
            cost_basis: CostBasis::Indexed {
                indexation_rate: dec!(0.06),
            },
            gains_exempt_after_years: None,
        }
    }
}

impl SimulationConfig {
    /// Amount borrowed: price minus down payment.
    pub fn loan_amount(&self) -> Money {
        self.property.price - self.property.down_payment
    }

    /// Interest attribution fraction, 1.0 unless overridden.
    pub fn interest_fraction(&self) -> Rate {
        self.loan.interest_portion_override.unwrap_or(Decimal::ONE)
    }

    /// Checks every invariant a run relies on.
    ///
    /// Reports the first violated field with a dotted path such as
    /// `property.down_payment`.
    pub fn validate(&self) -> EngineResult<()> {
        let property = &self.property;
        if property.price <= Decimal::ZERO {
            return Err(SimulationError::invalid(
                "property.price",
                "must be greater than zero",
            ));
        }
        non_negative("property.down_payment", property.down_payment)?;
        if property.down_payment >= property.price {
            return Err(SimulationError::invalid(
                "property.down_payment",
                "must be less than property.price",
            ));
        }
        fraction("property.appreciation_rate", property.appreciation_rate)?;
        horizon("property.holding_period_years", property.holding_period_years)?;

        let loan = &self.loan;
        fraction("loan.annual_interest_rate", loan.annual_interest_rate)?;
        horizon("loan.tenure_years", loan.tenure_years)?;
        if let Some(portion) = loan.interest_portion_override {
            if portion < Decimal::ZERO || portion > Decimal::ONE {
                return Err(SimulationError::invalid(
                    "loan.interest_portion_override",
                    format!("must be between 0 and 1, got {portion}"),
                ));
            }
        }

        let rent = &self.rent;
        non_negative("rent.initial_monthly_rent", rent.initial_monthly_rent)?;
        fraction("rent.rent_escalation_rate", rent.rent_escalation_rate)?;
        fraction("rent.investment_return_rate", rent.investment_return_rate)?;

        let costs = &self.costs;
        fraction("costs.stamp_duty_rate", costs.stamp_duty_rate)?;
        match &costs.registration_fee {
            RegistrationFee::Flat { amount } => {
                non_negative("costs.registration_fee.amount", *amount)?;
            }
            RegistrationFee::Capped { rate, cap } => {
                fraction("costs.registration_fee.rate", *rate)?;
                non_negative("costs.registration_fee.cap", *cap)?;
            }
        }
        fraction(
            "costs.processing_insurance_rate",
            costs.processing_insurance_rate,
        )?;
        non_negative("costs.one_time_interior_cost", costs.one_time_interior_cost)?;
        non_negative("costs.annual_upkeep", costs.annual_upkeep)?;
        fraction("costs.upkeep_escalation_rate", costs.upkeep_escalation_rate)?;
        fraction("costs.brokerage_rate_on_sale", costs.brokerage_rate_on_sale)?;

        let tax = &self.tax;
        fraction("tax.tax_bracket", tax.tax_bracket)?;
        non_negative(
            "tax.max_interest_deduction_per_year",
            tax.max_interest_deduction_per_year,
        )?;
        fraction("tax.capital_gains_tax_rate", tax.capital_gains_tax_rate)?;
        if let CostBasis::Indexed { indexation_rate } = tax.cost_basis {
            fraction("tax.cost_basis.indexation_rate", indexation_rate)?;
        }

        Ok(())
    }
}

fn non_negative(field: &str, value: Money) -> EngineResult<()> {
    if value < Decimal::ZERO {
        return Err(SimulationError::invalid(
            field,
            format!("must not be negative, got {value}"),
        ));
    }
    Ok(())
}

fn fraction(field: &str, value: Rate) -> EngineResult<()> {
    if value < Decimal::ZERO || value >= Decimal::ONE {
        return Err(SimulationError::invalid(
            field,
            format!("must be a fraction in [0, 1), got {value}"),
        ));
    }
    Ok(())
}

fn horizon(field: &str, years: u32) -> EngineResult<()> {
    if years == 0 || years > MAX_HORIZON_YEARS {
        return Err(SimulationError::invalid(
            field,
            format!("must be between 1 and {MAX_HORIZON_YEARS} years, got {years}"),
        ));
    }
    Ok(())
}
