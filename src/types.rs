use rust_decimal::Decimal;

/// Currency amounts in major units. Never rounded by the engine.
pub type Money = Decimal;

/// Rates expressed as fractions (0.05 = 5%), never as percentages.
pub type Rate = Decimal;
