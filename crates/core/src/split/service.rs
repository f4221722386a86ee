//! Split service: validation and calculation in one pass.
//!
//! The ledger calls into this service before any write. A share set is
//! always produced whole; callers swap it in as a unit.

use rust_decimal::Decimal;

use super::calculator::SplitCalculator;
use super::error::SplitError;
use super::types::{
    DECLARED_VALUE_SCALE, ExpenseHeader, OwnerIdentity, ParticipantInput, ShareDraft, SplitRule,
};
use super::validation::SplitValidator;

/// Split service for share planning and change detection.
pub struct SplitService;

impl SplitService {
    /// Validates a header plus its participant declarations and computes the
    /// complete share set.
    ///
    /// Personal expenses produce no shares. For group expenses the checks
    /// run in order: header, structure, identities, percentage budget, then
    /// calculation. Nothing is computed if any check fails.
    ///
    /// # Arguments
    ///
    /// * `header` - The normalized expense header
    /// * `participants` - External participant declarations, in display order
    /// * `owner` - The expense owner
    /// * `is_registered` - User directory lookup for usernames
    ///
    /// # Errors
    ///
    /// Returns the first `SplitError` encountered.
    pub fn plan<F>(
        header: &ExpenseHeader,
        participants: &[ParticipantInput],
        owner: &OwnerIdentity,
        is_registered: F,
    ) -> Result<Vec<ShareDraft>, SplitError>
    where
        F: Fn(&str) -> bool,
    {
        SplitValidator::validate_header(header, participants.len())?;

        let (Some(rule), Some(friend_count)) = (header.split_rule, header.friend_count) else {
            return Ok(vec![]);
        };
        if !header.is_group() {
            return Ok(vec![]);
        }

        let participants: Vec<ParticipantInput> =
            participants.iter().map(|p| p.normalized(rule)).collect();

        SplitValidator::validate_structure(friend_count, &participants)?;
        SplitValidator::validate_identities(
            &participants,
            owner,
            header.include_self,
            is_registered,
        )?;
        SplitValidator::validate_percentage_budget(rule, header.include_self, &participants)?;

        SplitCalculator::calculate(
            header.amount,
            rule,
            &participants,
            header.include_self,
            owner,
        )
    }

    /// Decides whether an update must regenerate the share set.
    ///
    /// Only fields that feed the calculator count, and only when their value
    /// actually differs: amount, split rule, friend count, include-self,
    /// expense type, and the participant declarations.
    ///
    /// # Arguments
    ///
    /// * `current` - The stored header
    /// * `stored` - The stored external declarations, in display order
    /// * `merged` - The header after applying the update
    /// * `incoming` - Replacement declarations, if the update carries any
    #[must_use]
    pub fn needs_regeneration(
        current: &ExpenseHeader,
        stored: &[ParticipantInput],
        merged: &ExpenseHeader,
        incoming: Option<&[ParticipantInput]>,
    ) -> bool {
        if current.expense_type != merged.expense_type {
            return true;
        }
        if !merged.is_group() {
            return false;
        }

        let header_changed = current.amount != merged.amount
            || current.split_rule != merged.split_rule
            || current.friend_count != merged.friend_count
            || current.include_self != merged.include_self;
        if header_changed {
            return true;
        }

        let Some(incoming) = incoming else {
            return false;
        };
        let Some(rule) = merged.split_rule else {
            return true;
        };

        incoming.len() != stored.len()
            || incoming
                .iter()
                .zip(stored)
                .any(|(new, old)| new.normalized(rule) != old.normalized(rule))
    }

    /// Picks the declarations to regenerate from.
    ///
    /// Replacement participants win. Without them a group expense replays
    /// its stored declarations, and an expense turned personal has none.
    #[must_use]
    pub fn participants_for_update(
        merged: &ExpenseHeader,
        stored: Vec<ParticipantInput>,
        incoming: Option<Vec<ParticipantInput>>,
    ) -> Vec<ParticipantInput> {
        match incoming {
            Some(incoming) => incoming,
            None if merged.is_group() => stored,
            None => vec![],
        }
    }

    /// Declared value to store for a share whose amount was edited in place,
    /// so that a later regeneration reproduces the edited amount.
    #[must_use]
    pub fn declared_value_for(rule: SplitRule, amount: Decimal, total: Decimal) -> Option<Decimal> {
        match rule {
            SplitRule::Equal => None,
            SplitRule::Exact => Some(amount),
            SplitRule::Percentage if total.is_zero() => None,
            SplitRule::Percentage => {
                Some((amount / total * Decimal::ONE_HUNDRED).round_dp(DECLARED_VALUE_SCALE))
            }
        }
    }
}
