//! Cent allocation using the Largest Remainder Method.
//!
//! Amounts are first floored to whole cents; the cents lost to flooring are
//! then handed out one at a time, largest fractional part first. Ties go to
//! the earliest position, so the owner's row (always last) receives a spare
//! cent only after every external participant has one.

use rust_decimal::prelude::*;
use splitledger_shared::types::{MONEY_SCALE, round_money};

/// Splits `total` into `count` parts that differ by at most one cent and sum
/// exactly to `total` rounded to cents.
///
/// ```
/// use rust_decimal_macros::dec;
/// use splitledger_core::split::allocation::allocate_equal;
///
/// assert_eq!(allocate_equal(dec!(100), 3), vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
/// ```
#[must_use]
pub fn allocate_equal(total: Decimal, count: usize) -> Vec<Decimal> {
    if count == 0 {
        return vec![];
    }

    let total = round_money(total);
    let count_dec = Decimal::from(count);
    let unit = Decimal::new(1, MONEY_SCALE);

    let base = (total / count_dec).round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::ToZero);
    let remainder = total - base * count_dec;
    let extra = units(remainder, unit);

    (0..count)
        .map(|i| if i < extra { base + unit } else { base })
        .collect()
}

/// Splits `total` in proportion to `weights`, rounding each part to cents
/// so that the parts sum exactly to `total` rounded to cents.
///
/// Used for percentage splits, where the weights are the declared
/// percentages. Weights that miss 100 by the accepted tolerance are scaled
/// so the parts still reconcile to the total.
#[must_use]
pub fn allocate_proportional(total: Decimal, weights: &[Decimal]) -> Vec<Decimal> {
    let weight_sum: Decimal = weights.iter().copied().sum();
    if weights.is_empty() || weight_sum <= Decimal::ZERO {
        return vec![Decimal::ZERO; weights.len()];
    }

    let unit = Decimal::new(1, MONEY_SCALE);
    let target = round_money(total);

    let exact: Vec<Decimal> = weights.iter().map(|w| *w * target / weight_sum).collect();
    let mut rounded: Vec<Decimal> = exact
        .iter()
        .map(|a| a.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::ToNegativeInfinity))
        .collect();

    let floored_sum: Decimal = rounded.iter().copied().sum();
    let to_distribute = units(target - floored_sum, unit);
    if to_distribute == 0 {
        return rounded;
    }

    let mut remainders: Vec<(usize, Decimal)> = exact
        .iter()
        .zip(rounded.iter())
        .enumerate()
        .map(|(i, (e, r))| (i, *e - *r))
        .collect();

    // Stable sort: equal remainders keep their original order.
    remainders.sort_by(|a, b| b.1.cmp(&a.1));

    for (idx, _) in remainders.iter().take(to_distribute) {
        rounded[*idx] += unit;
    }

    rounded
}

/// Number of whole `unit`s in a non-negative `amount`.
fn units(amount: Decimal, unit: Decimal) -> usize {
    (amount / unit)
        .round_dp_with_strategy(0, RoundingStrategy::ToZero)
        .to_usize()
        .unwrap_or(0)
}
