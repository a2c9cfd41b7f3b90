//! The yearly driver that runs the buy and rent tracks side by side.
//!
//! Each year advances the property value, pays twelve mortgage installments,
//! collects the interest deduction, pays a year of rent, and invests the
//! monthly surplus of installment over rent. The down payment seeds the rent
//! track's investment account, since a renter keeps that cash.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::amortization::{amortize_one_month, compute_fixed_payment, monthly_rate};
use crate::config::{CostRecognition, SimulationConfig};
use crate::costs::OneTimeCosts;
use crate::error::{EngineResult, SimulationError};
use crate::settlement::{Settlement, TerminalPosition, settle};
use crate::types::Money;

const MONTHS_PER_YEAR: u32 = 12;

/// One simulated year of both tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyRecord {
    /// Year number, starting at 1.
    pub year: u32,
    /// Purchase price compounded by appreciation for `year` years.
    pub property_value: Money,
    /// Interest component of this year's installments.
    pub interest_paid_this_year: Money,
    /// Principal component of this year's installments.
    pub principal_paid_this_year: Money,
    /// Loan balance at the end of the year.
    pub outstanding_principal: Money,
    /// Installments actually paid to the lender so far.
    pub cumulative_payment_paid: Money,
    /// Tax saved by the capped interest deduction.
    pub tax_savings_this_year: Money,
    /// Rent paid so far.
    pub cumulative_rent_paid: Money,
    /// Upkeep paid this year.
    pub upkeep_this_year: Money,
    /// Upkeep paid so far.
    pub cumulative_upkeep: Money,
    /// Rent track's investment balance at year end.
    pub investment_corpus: Money,
    /// Buy-track net worth under the configured cost recognition.
    pub net_worth_buy: Money,
    /// Rent-track net worth: the investment corpus.
    pub net_worth_rent: Money,
}

/// Output of [`run`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Amount borrowed.
    pub loan_amount: Money,
    /// The fixed installment, unrounded.
    pub monthly_payment: Money,
    /// Acquisition cost breakdown.
    pub one_time_costs: OneTimeCosts,
    /// One record per held year, in order.
    pub records: Vec<YearlyRecord>,
    /// Breakdown of the terminal sale.
    pub settlement: Settlement,
    /// Interest paid over the holding period.
    pub total_interest_paid: Money,
    /// Tax savings over the holding period.
    pub total_tax_savings: Money,
    /// Buy-track net worth after disposal costs.
    pub final_net_worth_buy: Money,
    /// Rent-track net worth at the end.
    pub final_net_worth_rent: Money,
}

impl SimulationResult {
    /// How far buying ends ahead of renting. Negative when renting wins.
    pub fn buy_advantage(&self) -> Money {
        self.final_net_worth_buy - self.final_net_worth_rent
    }
}

/// Running accumulators, alive for a single run only.
struct TrackState {
    outstanding: Money,
    investment_balance: Money,
    monthly_rent: Money,
    annual_upkeep: Money,
    cumulative_payment: Money,
    cumulative_rent: Money,
    cumulative_upkeep: Money,
    total_interest: Money,
    total_tax_savings: Money,
}

/// Runs the buy-versus-rent comparison over the holding period.
///
/// The configuration is validated first; nothing is simulated if it is
/// rejected. Running twice with the same configuration yields identical
/// results.
///
/// # Errors
///
/// `InvalidConfiguration` naming the offending field, or `NumericOverflow` if
/// a compounded value leaves the representable range.
pub fn run(config: &SimulationConfig) -> EngineResult<SimulationResult> {
    config.validate()?;

    let loan_amount = config.loan_amount();
    let holding_years = config.property.holding_period_years;
    let loan_rate = monthly_rate(config.loan.annual_interest_rate, config.loan.rate_convention);
    let investment_rate = config.rent.investment_return_rate / dec!(12);
    let interest_fraction = config.interest_fraction();
    let one_time_costs = OneTimeCosts::from_config(config);

    let payment = compute_fixed_payment(
        loan_amount,
        loan_rate,
        config.loan.tenure_years * MONTHS_PER_YEAR,
    )?;

    debug!(
        %loan_amount,
        %payment,
        holding_years,
        tenure_years = config.loan.tenure_years,
        "starting buy-versus-rent simulation"
    );

    let mut state = TrackState {
        outstanding: loan_amount,
        investment_balance: config.property.down_payment,
        monthly_rent: config.rent.initial_monthly_rent,
        annual_upkeep: config.costs.annual_upkeep,
        cumulative_payment: Decimal::ZERO,
        cumulative_rent: Decimal::ZERO,
        cumulative_upkeep: Decimal::ZERO,
        total_interest: Decimal::ZERO,
        total_tax_savings: Decimal::ZERO,
    };
    let mut records = Vec::with_capacity(holding_years as usize);
    let mut paid_off_logged = false;

    for year in 1..=holding_years {
        // Compounded from the purchase price every year.
        let property_value = (Decimal::ONE + config.property.appreciation_rate)
            .checked_powu(year.into())
            .and_then(|factor| config.property.price.checked_mul(factor))
            .ok_or_else(|| SimulationError::overflow(format!("property value in year {year}")))?;

        let mut interest_paid = Decimal::ZERO;
        let mut principal_paid = Decimal::ZERO;
        let mut amount_paid = Decimal::ZERO;
        for _ in 0..MONTHS_PER_YEAR {
            let month = amortize_one_month(state.outstanding, loan_rate, payment, interest_fraction);
            interest_paid += month.interest;
            principal_paid += month.principal;
            amount_paid += month.amount_paid();
            state.outstanding = month.new_balance;
        }
        if !paid_off_logged && state.outstanding.is_zero() {
            debug!(year, "loan fully repaid");
            paid_off_logged = true;
        }

        let tax_savings =
            interest_paid.min(config.tax.max_interest_deduction_per_year) * config.tax.tax_bracket;

        state.cumulative_payment += amount_paid;
        state.total_interest += interest_paid;
        state.total_tax_savings += tax_savings;
        let rent_this_year = checked(
            state.monthly_rent.checked_mul(Decimal::from(MONTHS_PER_YEAR)),
            || format!("rent paid in year {year}"),
        )?;
        state.cumulative_rent = checked(
            state.cumulative_rent.checked_add(rent_this_year),
            || format!("cumulative rent in year {year}"),
        )?;

        // End-of-month deposits after that month's growth.
        let contribution = (payment - state.monthly_rent).max(Decimal::ZERO);
        for _ in 0..MONTHS_PER_YEAR {
            state.investment_balance = checked(
                state
                    .investment_balance
                    .checked_mul(Decimal::ONE + investment_rate)
                    .and_then(|grown| grown.checked_add(contribution)),
                || format!("investment balance in year {year}"),
            )?;
        }

        let upkeep = state.annual_upkeep;
        state.cumulative_upkeep = checked(
            state.cumulative_upkeep.checked_add(upkeep),
            || format!("cumulative upkeep in year {year}"),
        )?;

        let equity = property_value - state.outstanding;
        let deducted = match config.costs.recognition {
            CostRecognition::Incremental if year == 1 => {
                one_time_costs.total().checked_add(state.cumulative_upkeep)
            }
            CostRecognition::Incremental => Some(state.cumulative_upkeep),
            CostRecognition::Sunk => one_time_costs.total().checked_add(state.cumulative_upkeep),
            CostRecognition::AtSettlement => Some(Decimal::ZERO),
        };
        let net_worth_buy = checked(
            deducted.and_then(|costs| equity.checked_sub(costs)),
            || format!("buy-track net worth in year {year}"),
        )?;

        let record = YearlyRecord {
            year,
            property_value,
            interest_paid_this_year: interest_paid,
            principal_paid_this_year: principal_paid,
            outstanding_principal: state.outstanding,
            cumulative_payment_paid: state.cumulative_payment,
            tax_savings_this_year: tax_savings,
            cumulative_rent_paid: state.cumulative_rent,
            upkeep_this_year: upkeep,
            cumulative_upkeep: state.cumulative_upkeep,
            investment_corpus: state.investment_balance,
            net_worth_buy,
            net_worth_rent: state.investment_balance,
        };
        trace!(year, net_worth_buy = %record.net_worth_buy, net_worth_rent = %record.net_worth_rent, "year simulated");
        records.push(record);

        if year < holding_years {
            state.monthly_rent = checked(
                state
                    .monthly_rent
                    .checked_mul(Decimal::ONE + config.rent.rent_escalation_rate),
                || format!("rent escalation after year {year}"),
            )?;
            state.annual_upkeep = checked(
                state
                    .annual_upkeep
                    .checked_mul(Decimal::ONE + config.costs.upkeep_escalation_rate),
                || format!("upkeep escalation after year {year}"),
            )?;
        }
    }

    // holding_period_years >= 1 after validation
    let final_property_value = records
        .last()
        .map(|record| record.property_value)
        .unwrap_or(config.property.price);

    let settlement = settle(
        config,
        &TerminalPosition {
            years: holding_years,
            property_value: final_property_value,
            outstanding_principal: state.outstanding,
            investment_balance: state.investment_balance,
            one_time_costs: one_time_costs.total(),
            cumulative_upkeep: state.cumulative_upkeep,
        },
    )?;

    debug!(
        final_net_worth_buy = %settlement.net_worth_buy,
        final_net_worth_rent = %settlement.net_worth_rent,
        "simulation finished"
    );

    Ok(SimulationResult {
        loan_amount,
        monthly_payment: payment,
        one_time_costs,
        records,
        final_net_worth_buy: settlement.net_worth_buy,
        final_net_worth_rent: settlement.net_worth_rent,
        settlement,
        total_interest_paid: state.total_interest,
        total_tax_savings: state.total_tax_savings,
    })
}

fn checked(value: Option<Money>, context: impl FnOnce() -> String) -> EngineResult<Money> {
    value.ok_or_else(|| SimulationError::overflow(context()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CostBasis;
    use rstest::{fixture, rstest};

    #[fixture]
    fn frictionless() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.costs.stamp_duty_rate = dec!(0);
        config.costs.registration_fee = crate::config::RegistrationFee::Flat { amount: dec!(0) };
        config.costs.processing_insurance_rate = dec!(0);
        config.costs.annual_upkeep = dec!(0);
        config.tax.tax_bracket = dec!(0);
        config.tax.capital_gains_tax_rate = dec!(0);
        config
    }

    #[rstest]
    fn test_one_record_per_year(frictionless: SimulationConfig) {
        let result = run(&frictionless).unwrap();
        assert_eq!(result.records.len(), 20);
        for (index, record) in result.records.iter().enumerate() {
            assert_eq!(record.year as usize, index + 1);
        }
    }

    #[rstest]
    fn test_rent_for_a_year_uses_pre_escalation_value(frictionless: SimulationConfig) {
        let result = run(&frictionless).unwrap();
        assert_eq!(result.records[0].cumulative_rent_paid, dec!(240_000));
        assert_eq!(result.records[1].cumulative_rent_paid, dec!(240_000) + dec!(252_000));
    }

    #[rstest]
    fn test_tax_savings_are_capped(mut frictionless: SimulationConfig) {
        frictionless.tax.tax_bracket = dec!(0.30);
        let result = run(&frictionless).unwrap();
        // Year-one interest on 8m at 8.5% is well above the 200k cap.
        assert_eq!(result.records[0].tax_savings_this_year, dec!(60_000));
    }

    #[rstest]
    fn test_upkeep_escalates_after_each_year(mut frictionless: SimulationConfig) {
        frictionless.costs.annual_upkeep = dec!(100_000);
        frictionless.costs.upkeep_escalation_rate = dec!(0.10);
        let result = run(&frictionless).unwrap();

        assert_eq!(result.records[0].upkeep_this_year, dec!(100_000));
        assert_eq!(result.records[1].upkeep_this_year, dec!(110_000));
        assert_eq!(result.records[1].cumulative_upkeep, dec!(210_000));
    }

    #[fixture]
    fn with_costs(mut frictionless: SimulationConfig) -> SimulationConfig {
        frictionless.costs.stamp_duty_rate = dec!(0.06);
        frictionless.costs.annual_upkeep = dec!(90_000);
        frictionless
    }

    fn run_with(mut config: SimulationConfig, recognition: CostRecognition) -> SimulationResult {
        config.costs.recognition = recognition;
        run(&config).unwrap()
    }

    #[rstest]
    fn test_one_time_costs_reduce_the_first_year_only(with_costs: SimulationConfig) {
        let incremental = run_with(with_costs.clone(), CostRecognition::Incremental);
        let equity_only = run_with(with_costs, CostRecognition::AtSettlement);

        for (index, (a, b)) in incremental.records.iter().zip(&equity_only.records).enumerate() {
            let one_time = if index == 0 { dec!(600_000) } else { dec!(0) };
            let expected = b.net_worth_buy - one_time - a.cumulative_upkeep;
            assert!((a.net_worth_buy - expected).abs() < dec!(0.000001));
        }

        let second = &incremental.records[1];
        assert_eq!(
            second.net_worth_buy,
            second.property_value - second.outstanding_principal - dec!(180_000)
        );

        let last = incremental.records.last().unwrap();
        assert_eq!(
            incremental.settlement.holding_costs,
            dec!(600_000) + dec!(90_000) * dec!(20)
        );
        assert_eq!(
            incremental.final_net_worth_buy,
            last.property_value
                - last.outstanding_principal
                - incremental.settlement.disposal_costs
                - dec!(2_400_000)
        );
    }

    #[rstest]
    fn test_sunk_costs_reduce_every_year(with_costs: SimulationConfig) {
        let sunk = run_with(with_costs.clone(), CostRecognition::Sunk);
        let equity_only = run_with(with_costs, CostRecognition::AtSettlement);

        for (a, b) in sunk.records.iter().zip(&equity_only.records) {
            let expected_gap = dec!(600_000) + a.cumulative_upkeep;
            let gap = b.net_worth_buy - a.net_worth_buy;
            assert!((gap - expected_gap).abs() < dec!(0.000001));
        }
    }

    #[rstest]
    #[case(CostRecognition::Sunk)]
    #[case(CostRecognition::AtSettlement)]
    fn test_recognition_leaves_settlement_unchanged(
        with_costs: SimulationConfig,
        #[case] recognition: CostRecognition,
    ) {
        let incremental = run_with(with_costs.clone(), CostRecognition::Incremental);
        let other = run_with(with_costs, recognition);
        assert_eq!(incremental.settlement, other.settlement);
        assert_eq!(incremental.final_net_worth_buy, other.final_net_worth_buy);
    }

    #[rstest]
    fn test_runaway_rent_reports_overflow(mut frictionless: SimulationConfig) {
        frictionless.property.holding_period_years = 100;
        frictionless.loan.tenure_years = 30;
        frictionless.rent.rent_escalation_rate = dec!(0.95);
        assert!(frictionless.validate().is_ok());

        let err = run(&frictionless).unwrap_err();
        assert!(
            matches!(err, SimulationError::NumericOverflow { ref context } if context.contains("rent")),
            "unexpected error {err:?}"
        );
    }

    #[rstest]
    fn test_runaway_upkeep_reports_overflow(mut with_costs: SimulationConfig) {
        with_costs.property.holding_period_years = 100;
        with_costs.costs.annual_upkeep = dec!(1_000_000_000_000);
        with_costs.costs.upkeep_escalation_rate = dec!(0.99);

        let err = run(&with_costs).unwrap_err();
        assert!(matches!(err, SimulationError::NumericOverflow { .. }));
    }

    #[rstest]
    fn test_short_holding_leaves_a_balance(mut frictionless: SimulationConfig) {
        frictionless.property.holding_period_years = 5;
        let result = run(&frictionless).unwrap();
        let last = result.records.last().unwrap();

        assert_eq!(result.records.len(), 5);
        assert!(last.outstanding_principal > dec!(0));
        assert_eq!(
            result.settlement.net_worth_buy,
            last.property_value - last.outstanding_principal
        );
    }

    #[rstest]
    fn test_rent_above_payment_contributes_nothing(mut frictionless: SimulationConfig) {
        frictionless.rent.initial_monthly_rent = dec!(100_000);
        frictionless.rent.investment_return_rate = dec!(0);
        let result = run(&frictionless).unwrap();
        assert!(result
            .records
            .iter()
            .all(|r| r.investment_corpus == dec!(2_000_000)));
    }

    #[rstest]
    fn test_indexed_settlement_uses_holding_period(mut frictionless: SimulationConfig) {
        frictionless.property.holding_period_years = 5;
        frictionless.tax.capital_gains_tax_rate = dec!(0.20);
        frictionless.tax.cost_basis = CostBasis::Indexed {
            indexation_rate: dec!(0.02),
        };
        let result = run(&frictionless).unwrap();

        let basis = dec!(10_000_000) * dec!(1.02).powu(5);
        assert_eq!(result.settlement.cost_basis, basis);
        assert_eq!(
            result.settlement.capital_gains_tax,
            (result.records[4].property_value - basis) * dec!(0.20)
        );
    }

    #[test]
    fn test_invalid_config_is_rejected_before_running() {
        let mut config = SimulationConfig::default();
        config.loan.tenure_years = 0;
        let err = run(&config).unwrap_err();
        assert_eq!(
            err,
            SimulationError::InvalidConfiguration {
                field: "loan.tenure_years".into(),
                reason: "must be between 1 and 100 years, got 0".into(),
            }
        );
    }
}
