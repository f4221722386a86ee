//! Property-based tests for split calculation.
//!
//! Covers the reconciliation guarantees of each split rule: shares always
//! add back up to the total, residuals land on the owner, and splits that
//! exclude the owner are rejected unless they reconcile.

use proptest::prelude::*;
use rust_decimal::Decimal;
use splitledger_shared::types::{TOLERANCE, UserId};

use super::calculator::SplitCalculator;
use super::error::SplitError;
use super::service::SplitService;
use super::types::{ExpenseHeader, ExpenseType, OwnerIdentity, ParticipantInput, SplitRule};

/// Strategy for a positive total from 0.01 to 1,000,000.00.
fn total_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for a non-negative exact amount up to 10,000.00.
fn exact_amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for a percentage in 0.00..=100.00.
fn percentage() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|hundredths| Decimal::new(hundredths, 2))
}

fn owner() -> OwnerIdentity {
    OwnerIdentity {
        user_id: UserId::new(),
        username: "owner".to_string(),
        display_name: "Owner".to_string(),
        email: None,
    }
}

fn participants(values: &[Option<Decimal>]) -> Vec<ParticipantInput> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| ParticipantInput {
            name: format!("p{i}"),
            email: Some(format!("p{i}@example.com")),
            value: *value,
            ..ParticipantInput::default()
        })
        .collect()
}

fn sum(shares: &[super::types::ShareDraft]) -> Decimal {
    shares.iter().map(|s| s.amount).sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Equal split: shares sum to the total and each is within a cent of total / P.
    #[test]
    fn prop_equal_split_reconciles(
        total in total_amount(),
        friends in 1usize..12,
        include_self in any::<bool>(),
    ) {
        let inputs = participants(&vec![None; friends]);
        let shares = SplitCalculator::calculate(total, SplitRule::Equal, &inputs, include_self, &owner())
            .unwrap();

        let p = friends + usize::from(include_self);
        prop_assert_eq!(shares.len(), p);
        prop_assert_eq!(sum(&shares), total);

        let fair = total / Decimal::from(p);
        for share in &shares {
            prop_assert!((share.amount - fair).abs() <= TOLERANCE);
        }
    }

    /// Exact split with the owner: owner row is the residual, possibly negative.
    #[test]
    fn prop_exact_with_owner_takes_residual(
        total in total_amount(),
        amounts in prop::collection::vec(exact_amount(), 1..8),
    ) {
        let inputs = participants(&amounts.iter().copied().map(Some).collect::<Vec<_>>());
        let shares = SplitCalculator::calculate(total, SplitRule::Exact, &inputs, true, &owner())
            .unwrap();

        let external: Decimal = amounts.iter().copied().sum();
        let owner_row = shares.last().unwrap();
        prop_assert!(owner_row.is_owner_share);
        prop_assert!(owner_row.is_paid);
        prop_assert_eq!(owner_row.amount, total - external);
        prop_assert_eq!(sum(&shares), total);
    }

    /// Exact split without the owner: accepted iff the amounts reconcile.
    #[test]
    fn prop_exact_without_owner_requires_reconciliation(
        total in total_amount(),
        amounts in prop::collection::vec(exact_amount(), 1..8),
    ) {
        let inputs = participants(&amounts.iter().copied().map(Some).collect::<Vec<_>>());
        let result = SplitCalculator::calculate(total, SplitRule::Exact, &inputs, false, &owner());

        let declared: Decimal = amounts.iter().copied().sum();
        if (declared - total).abs() <= TOLERANCE {
            prop_assert!(result.is_ok());
        } else {
            let is_mismatch = matches!(result, Err(SplitError::SplitMismatch { .. }));
            prop_assert!(is_mismatch);
        }
    }

    /// Exact split that reconciles by construction is always accepted.
    #[test]
    fn prop_exact_without_owner_accepts_reconciled(
        amounts in prop::collection::vec(exact_amount(), 1..8),
    ) {
        let total: Decimal = amounts.iter().copied().sum();
        prop_assume!(total > Decimal::ZERO);

        let inputs = participants(&amounts.iter().copied().map(Some).collect::<Vec<_>>());
        let shares = SplitCalculator::calculate(total, SplitRule::Exact, &inputs, false, &owner())
            .unwrap();
        prop_assert_eq!(sum(&shares), total);
    }

    /// Percentage split without the owner: accepted iff percentages reach 100,
    /// and an accepted split always sums to the total.
    #[test]
    fn prop_percentage_without_owner_requires_hundred(
        total in total_amount(),
        pcts in prop::collection::vec(percentage(), 1..6),
    ) {
        let inputs = participants(&pcts.iter().copied().map(Some).collect::<Vec<_>>());
        let result = SplitCalculator::calculate(total, SplitRule::Percentage, &inputs, false, &owner());

        let declared: Decimal = pcts.iter().copied().sum();
        if (declared - Decimal::ONE_HUNDRED).abs() <= TOLERANCE {
            let shares = result.unwrap();
            prop_assert_eq!(sum(&shares), total);
        } else {
            let is_mismatch = matches!(result, Err(SplitError::SplitMismatch { .. }));
            prop_assert!(is_mismatch);
        }
    }

    /// Percentage split built to total exactly 100% sums to the total.
    #[test]
    fn prop_percentage_without_owner_sums_to_total(
        total in total_amount(),
        first in 0i64..=10_000i64,
    ) {
        let a = Decimal::new(first, 2);
        let b = Decimal::ONE_HUNDRED - a;
        let inputs = participants(&[Some(a), Some(b)]);

        let shares = SplitCalculator::calculate(total, SplitRule::Percentage, &inputs, false, &owner())
            .unwrap();
        prop_assert_eq!(sum(&shares), total);

        for (share, pct) in shares.iter().zip([a, b]) {
            let exact = pct / Decimal::ONE_HUNDRED * total;
            prop_assert!((share.amount - exact).abs() <= TOLERANCE);
        }
    }

    /// Percentage split with the owner: owner row absorbs the residual.
    #[test]
    fn prop_percentage_with_owner_takes_residual(
        total in total_amount(),
        pcts in prop::collection::vec(0i64..=2_000i64, 1..5),
    ) {
        let pcts: Vec<Decimal> = pcts.into_iter().map(|p| Decimal::new(p, 2)).collect();
        let inputs = participants(&pcts.iter().copied().map(Some).collect::<Vec<_>>());

        let shares = SplitCalculator::calculate(total, SplitRule::Percentage, &inputs, true, &owner())
            .unwrap();
        prop_assert_eq!(sum(&shares), total);

        let declared: Decimal = pcts.iter().copied().sum();
        let expected_owner = (Decimal::ONE_HUNDRED - declared) / Decimal::ONE_HUNDRED * total;
        let owner_row = shares.last().unwrap();
        let slack = TOLERANCE * Decimal::from(pcts.len());
        prop_assert!((owner_row.amount - expected_owner).abs() <= slack);
    }

    /// Re-planning the same input yields byte-identical shares.
    #[test]
    fn prop_planning_is_deterministic(
        total in total_amount(),
        friends in 1u32..6,
    ) {
        let header = ExpenseHeader {
            name: "prop".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            amount: total,
            note: None,
            expense_type: ExpenseType::Group,
            split_rule: Some(SplitRule::Equal),
            friend_count: Some(friends),
            include_self: true,
        };
        let inputs = participants(&vec![None; friends as usize]);
        let owner = owner();

        let first = SplitService::plan(&header, &inputs, &owner, |_| true).unwrap();
        let second = SplitService::plan(&header, &inputs, &owner, |_| true).unwrap();
        prop_assert_eq!(first, second);
    }
}
