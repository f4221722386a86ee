//! Share calculation for group expenses.
//!
//! Turns a total, a split rule and the external participant declarations
//! into the ordered share rows: externals first in request order, followed
//! by the owner's row when the owner takes part.

use rust_decimal::Decimal;
use splitledger_shared::types::{round_money, within_tolerance};

use super::allocation::{allocate_equal, allocate_proportional};
use super::error::SplitError;
use super::types::{OwnerIdentity, ParticipantInput, ShareDraft, SplitRule};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Pure share calculator.
pub struct SplitCalculator;

impl SplitCalculator {
    /// Calculates every share of a group expense.
    ///
    /// With N external participants and P = N + 1 when `include_self`:
    /// - `Equal`: every row gets `total / P`; leftover cents go to the
    ///   earliest rows.
    /// - `Exact`: externals get their declared amount; the owner gets the
    ///   residual, which may be negative. Without the owner the declared
    ///   amounts must reconcile to the total within one cent.
    /// - `Percentage`: externals get `pct / 100 * total`; the owner gets the
    ///   residual. Without the owner the percentages must reconcile to 100
    ///   within 0.01, and the shares are apportioned so they still sum to
    ///   the total.
    ///
    /// # Errors
    ///
    /// Returns `MissingAmount`, `NegativeAmount` or `PercentageOutOfRange`
    /// for bad declarations and `SplitMismatch` when a split without the
    /// owner does not reconcile.
    pub fn calculate(
        total: Decimal,
        rule: SplitRule,
        participants: &[ParticipantInput],
        include_self: bool,
        owner: &OwnerIdentity,
    ) -> Result<Vec<ShareDraft>, SplitError> {
        let total = round_money(total);

        let (external, owner_amount) = match rule {
            SplitRule::Equal => Self::equal(total, participants.len(), include_self),
            SplitRule::Exact => Self::exact(total, participants, include_self)?,
            SplitRule::Percentage => Self::percentage(total, participants, include_self)?,
        };

        let mut shares: Vec<ShareDraft> = participants
            .iter()
            .zip(external)
            .map(|(input, amount)| ShareDraft::external(input, amount))
            .collect();

        if let Some(amount) = owner_amount {
            shares.push(ShareDraft::owner(owner, amount));
        }

        Ok(shares)
    }

    fn equal(total: Decimal, count: usize, include_self: bool) -> (Vec<Decimal>, Option<Decimal>) {
        let mut parts = allocate_equal(total, count + usize::from(include_self));
        let owner = if include_self { parts.pop() } else { None };
        (parts, owner)
    }

    fn exact(
        total: Decimal,
        participants: &[ParticipantInput],
        include_self: bool,
    ) -> Result<(Vec<Decimal>, Option<Decimal>), SplitError> {
        let amounts = participants
            .iter()
            .enumerate()
            .map(|(index, p)| {
                let value = p.value.ok_or(SplitError::MissingAmount { index })?;
                if value < Decimal::ZERO {
                    return Err(SplitError::NegativeAmount { index, value });
                }
                Ok(round_money(value))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let declared: Decimal = amounts.iter().copied().sum();

        if include_self {
            return Ok((amounts, Some(total - declared)));
        }

        if !within_tolerance(declared, total) {
            return Err(SplitError::SplitMismatch {
                expected: total,
                actual: declared,
            });
        }

        Ok((amounts, None))
    }

    fn percentage(
        total: Decimal,
        participants: &[ParticipantInput],
        include_self: bool,
    ) -> Result<(Vec<Decimal>, Option<Decimal>), SplitError> {
        let percentages = Self::percentages(participants)?;
        let declared: Decimal = percentages.iter().copied().sum();

        if include_self {
            let amounts: Vec<Decimal> = percentages
                .iter()
                .map(|pct| round_money(*pct / HUNDRED * total))
                .collect();
            let external: Decimal = amounts.iter().copied().sum();
            return Ok((amounts, Some(total - external)));
        }

        if !within_tolerance(declared, HUNDRED) {
            return Err(SplitError::SplitMismatch {
                expected: HUNDRED,
                actual: declared,
            });
        }

        Ok((allocate_proportional(total, &percentages), None))
    }

    fn percentages(participants: &[ParticipantInput]) -> Result<Vec<Decimal>, SplitError> {
        participants
            .iter()
            .enumerate()
            .map(|(index, p)| {
                let value = p.value.ok_or(SplitError::MissingAmount { index })?;
                if value < Decimal::ZERO || value > HUNDRED {
                    return Err(SplitError::PercentageOutOfRange { index, value });
                }
                Ok(value)
            })
            .collect()
    }
}
