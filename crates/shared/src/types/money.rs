//! Monetary helpers with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` stored with two decimal places.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places every stored amount carries.
pub const MONEY_SCALE: u32 = 2;

/// Largest discrepancy (one cent) tolerated when reconciling sums.
pub const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Rounds an amount to the stored scale using Banker's Rounding.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Returns true if `actual` is within one cent of `expected`.
#[must_use]
pub fn within_tolerance(actual: Decimal, expected: Decimal) -> bool {
    (actual - expected).abs() <= TOLERANCE
}
