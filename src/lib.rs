//! `buy_vs_rent` is a Rust library for comparing two ways of living in a home
//! over the same number of years:
//!
//! - **Buy**: pay a down payment and a fixed-rate mortgage, hold an
//!   appreciating property, pay upkeep, then sell it at the end.
//! - **Rent**: keep the down payment invested, pay rent, and invest whatever the
//!   mortgage installment would have exceeded the rent by, every month.
//!
//! The engine is a pure function of a [`SimulationConfig`]. It produces one
//! [`YearlyRecord`] per held year and a final [`Settlement`] that applies
//! capital gains tax and brokerage to a hypothetical sale. Amounts are
//! [`rust_decimal::Decimal`] values kept at full precision; rounding and
//! formatting belong to the caller.
//!
//! ## Usage
//!
//! Add `buy_vs_rent` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! buy_vs_rent = "0.1.0"
//! rust_decimal = "1.39.0"
//! rust_decimal_macros = "1.39.0"
//! ```
//!
//! Then build a configuration and call [`run`]:
//!
//! ```rust
//! use buy_vs_rent::{run, SimulationConfig};
//! use rust_decimal_macros::dec;
//!
//! fn main() {
//!     let mut config = SimulationConfig::default();
//!     config.property.price = dec!(10_000_000);
//!     config.property.down_payment = dec!(2_000_000);
//!     config.loan.annual_interest_rate = dec!(0.085);
//!     config.rent.investment_return_rate = dec!(0.12);
//!
//!     match run(&config) {
//!         Ok(result) => {
//!             println!("Monthly payment:   {:.2}", result.monthly_payment);
//!             println!("Net worth (buy):   {:.2}", result.final_net_worth_buy);
//!             println!("Net worth (rent):  {:.2}", result.final_net_worth_rent);
//!         }
//!         Err(e) => {
//!             eprintln!("Error running simulation: {}", e);
//!         }
//!     }
//! }
//! ```

pub mod amortization;
pub mod config;
pub mod costs;
pub mod error;
pub mod settlement;
pub mod simulation;
pub mod types;

pub use amortization::{
    AmortizationSchedule, MonthPayment, amortization_schedule, amortize_one_month,
    compute_fixed_payment, monthly_rate,
};
pub use config::{
    CostBasis, CostRecognition, CostTerms, LoanTerms, MAX_HORIZON_YEARS, PropertyTerms,
    RateConvention, RegistrationFee, RentTerms, SimulationConfig, TaxTerms,
};
pub use costs::OneTimeCosts;
pub use error::{EngineResult, SimulationError};
pub use settlement::{Settlement, TerminalPosition, cost_basis, settle};
pub use simulation::{SimulationResult, YearlyRecord, run};
pub use types::{Money, Rate};
