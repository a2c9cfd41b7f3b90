use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::types::Money;

/// Costs paid once, when the home is bought.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneTimeCosts {
    /// Stamp duty on the purchase price.
    pub stamp_duty: Money,
    /// Registration fee, flat or capped.
    pub registration_fee: Money,
    /// Processing fee and loan insurance on the borrowed amount.
    pub processing_insurance: Money,
    /// Interior and furnishing spend.
    pub interior: Money,
}

impl OneTimeCosts {
    pub fn from_config(config: &SimulationConfig) -> Self {
        let price = config.property.price;
        let costs = &config.costs;
        Self {
            stamp_duty: price * costs.stamp_duty_rate,
            registration_fee: costs.registration_fee.amount_for(price),
            processing_insurance: config.loan_amount() * costs.processing_insurance_rate,
            interior: costs.one_time_interior_cost,
        }
    }

    pub fn total(&self) -> Money {
        self.stamp_duty + self.registration_fee + self.processing_insurance + self.interior
    }
}
