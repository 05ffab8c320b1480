//! Monetary rounding helpers

use bigdecimal::{BigDecimal, RoundingMode};

/// Round a monetary figure to 2 decimal places, half-up.
///
/// Applied exactly once at the boundary of each computed figure;
/// intermediate values stay unrounded.
pub fn round_money(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}

/// The tolerance used when two monetary figures are compared (0.01)
pub fn comparison_tolerance() -> BigDecimal {
    BigDecimal::from(1) / BigDecimal::from(100)
}
