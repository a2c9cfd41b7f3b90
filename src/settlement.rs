//! The hypothetical sale at the end of the holding period.

use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::config::{CostBasis, SimulationConfig};
use crate::error::{EngineResult, SimulationError};
use crate::types::Money;

/// Where both tracks stand after the last simulated year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalPosition {
    /// Years the property was held.
    pub years: u32,
    /// Property value at the end of the last year.
    pub property_value: Money,
    /// Loan balance still owed.
    pub outstanding_principal: Money,
    /// The rent track's investment account.
    pub investment_balance: Money,
    /// Total acquisition costs paid at purchase.
    pub one_time_costs: Money,
    /// Upkeep paid over the whole holding period.
    pub cumulative_upkeep: Money,
}

/// Breakdown of the terminal comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// Price the property is sold at.
    pub sale_value: Money,
    /// Acquisition cost used for the gain.
    pub cost_basis: Money,
    /// Sale value minus cost basis. Negative when the property lost ground.
    pub capital_gain: Money,
    /// Tax on a positive gain, zero when exempt.
    pub capital_gains_tax: Money,
    /// Brokerage on the sale value.
    pub brokerage: Money,
    /// Gains tax plus brokerage.
    pub disposal_costs: Money,
    /// One-time acquisition costs plus all upkeep paid while holding.
    pub holding_costs: Money,
    /// Final net worth of the buy track.
    pub net_worth_buy: Money,
    /// The investment balance. Liquid assets carry no disposal friction.
    pub net_worth_rent: Money,
}

/// Acquisition cost used for the gains computation after `years`.
pub fn cost_basis(price: Money, basis: &CostBasis, years: u32) -> EngineResult<Money> {
    match basis {
        CostBasis::PurchasePrice => Ok(price),
        CostBasis::Indexed { indexation_rate } => (Decimal::ONE + indexation_rate)
            .checked_powu(years.into())
            .and_then(|factor| price.checked_mul(factor))
            .ok_or_else(|| SimulationError::overflow("indexed cost basis")),
    }
}

/// Sells the property at its terminal value and settles both tracks.
///
/// One-time and upkeep costs are always part of the buy track's final figure,
/// whether or not the yearly records already showed them, so the result does
/// not depend on [`crate::config::CostRecognition`].
pub fn settle(config: &SimulationConfig, position: &TerminalPosition) -> EngineResult<Settlement> {
    let tax = &config.tax;
    let sale_value = position.property_value;

    let cost_basis = cost_basis(config.property.price, &tax.cost_basis, position.years)?;
    let capital_gain = sale_value - cost_basis;

    let exempt = tax
        .gains_exempt_after_years
        .is_some_and(|threshold| position.years >= threshold);
    let capital_gains_tax = if exempt {
        Decimal::ZERO
    } else {
        (capital_gain * tax.capital_gains_tax_rate).max(Decimal::ZERO)
    };

    let brokerage = sale_value * config.costs.brokerage_rate_on_sale;
    let disposal_costs = capital_gains_tax + brokerage;
    let holding_costs = position
        .one_time_costs
        .checked_add(position.cumulative_upkeep)
        .ok_or_else(|| SimulationError::overflow("holding costs at settlement"))?;

    let net_worth_buy = (sale_value - position.outstanding_principal - disposal_costs)
        .checked_sub(holding_costs)
        .ok_or_else(|| SimulationError::overflow("buy-track net worth at settlement"))?;

    Ok(Settlement {
        sale_value,
        cost_basis,
        capital_gain,
        capital_gains_tax,
        brokerage,
        disposal_costs,
        holding_costs,
        net_worth_buy,
        net_worth_rent: position.investment_balance,
    })
}
