//! Business rule validation for split requests and share edits.

use std::collections::HashSet;

use rust_decimal::Decimal;
use splitledger_shared::types::{ParticipantId, within_tolerance};

use super::error::{IssueKind, ParticipantIssue, SplitError};
use super::types::{ExpenseHeader, ExpenseType, OwnerIdentity, ParticipantInput, SplitRule};

/// Stored state of one share row, as seen by the post-hoc edit checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareSnapshot {
    /// Row id.
    pub id: ParticipantId,
    /// Registered username, if any.
    pub username: Option<String>,
    /// Email, if any.
    pub email: Option<String>,
    /// Current amount.
    pub amount: Decimal,
    /// Whether this is the owner's synthetic row.
    pub is_owner_share: bool,
}

/// Pure split validator.
pub struct SplitValidator;

impl SplitValidator {
    /// Validates the header and the presence of participants.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveTotal`, `PersonalWithParticipants`,
    /// `MissingSplitRule` or `MissingFriendCount`.
    pub fn validate_header(
        header: &ExpenseHeader,
        participant_count: usize,
    ) -> Result<(), SplitError> {
        if header.amount <= Decimal::ZERO {
            return Err(SplitError::NonPositiveTotal(header.amount));
        }

        match header.expense_type {
            ExpenseType::Personal if participant_count > 0 => {
                Err(SplitError::PersonalWithParticipants)
            }
            ExpenseType::Personal => Ok(()),
            ExpenseType::Group => {
                if header.split_rule.is_none() {
                    return Err(SplitError::MissingSplitRule);
                }
                if header.friend_count.is_none() {
                    return Err(SplitError::MissingFriendCount);
                }
                Ok(())
            }
        }
    }

    /// Checks that a group expense has participants and that their number
    /// matches the declared friend count.
    ///
    /// # Errors
    ///
    /// Returns `GroupDetailsRequired` or `ParticipantCountMismatch`.
    pub fn validate_structure(
        friend_count: u32,
        participants: &[ParticipantInput],
    ) -> Result<(), SplitError> {
        if participants.is_empty() {
            return Err(SplitError::GroupDetailsRequired);
        }

        let matches = usize::try_from(friend_count).is_ok_and(|n| n == participants.len());
        if !matches {
            return Err(SplitError::ParticipantCountMismatch {
                expected: friend_count,
                actual: participants.len(),
            });
        }

        Ok(())
    }

    /// Checks every participant's identity and rejects the whole batch if
    /// any entry is invalid.
    ///
    /// Uniqueness is checked across the materialized share set, so with
    /// `include_self` the owner's username and email are already taken.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParticipants` carrying one issue per bad field.
    pub fn validate_identities<F>(
        participants: &[ParticipantInput],
        owner: &OwnerIdentity,
        include_self: bool,
        is_registered: F,
    ) -> Result<(), SplitError>
    where
        F: Fn(&str) -> bool,
    {
        let mut usernames: HashSet<&str> = HashSet::new();
        let mut emails: HashSet<&str> = HashSet::new();
        if include_self {
            usernames.insert(owner.username.as_str());
            if let Some(email) = owner.email.as_deref() {
                emails.insert(email);
            }
        }

        let mut issues = Vec::new();

        for (index, participant) in participants.iter().enumerate() {
            let username = participant.username_key();
            let email = participant.email_key();

            if username.is_none() && email.is_none() {
                issues.push(ParticipantIssue::new(
                    format!("participants[{index}].username"),
                    IssueKind::MissingIdentity,
                ));
                continue;
            }

            if let Some(username) = username {
                let field = format!("participants[{index}].username");
                if !usernames.insert(username) {
                    issues.push(ParticipantIssue::new(
                        field,
                        IssueKind::DuplicateIdentity {
                            field: "username",
                            value: username.to_string(),
                        },
                    ));
                } else if !is_registered(username) {
                    issues.push(ParticipantIssue::new(
                        field,
                        IssueKind::UnregisteredUsername {
                            username: username.to_string(),
                        },
                    ));
                }
            }

            if let Some(email) = email {
                if !emails.insert(email) {
                    issues.push(ParticipantIssue::new(
                        format!("participants[{index}].email"),
                        IssueKind::DuplicateIdentity {
                            field: "email",
                            value: email.to_string(),
                        },
                    ));
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(SplitError::InvalidParticipants(issues))
        }
    }

    /// With the owner included in a percentage split, the external
    /// percentages must leave a positive residual for the owner.
    ///
    /// # Errors
    ///
    /// Returns `PercentageOverflow` when the externals reach 100%.
    pub fn validate_percentage_budget(
        rule: SplitRule,
        include_self: bool,
        participants: &[ParticipantInput],
    ) -> Result<(), SplitError> {
        if rule != SplitRule::Percentage || !include_self {
            return Ok(());
        }

        let total_percentage: Decimal = participants.iter().filter_map(|p| p.value).sum();
        if total_percentage >= Decimal::ONE_HUNDRED {
            return Err(SplitError::PercentageOverflow { total_percentage });
        }

        Ok(())
    }

    /// Re-checks the share set after one row is edited in place.
    ///
    /// `siblings` are the other rows of the expense and `edited` is the row
    /// as it would be stored after the edit.
    ///
    /// When the owner takes part and an external row is edited, the owner's
    /// row absorbs the difference. The returned amount is the owner's new
    /// share in that case. Otherwise the rows must still add up to the total.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParticipants` for identity problems,
    /// `InvariantViolated` when the shares no longer add up to the total and
    /// `ShareOverflow` when a percentage split with the owner would leave the
    /// owner nothing.
    pub fn validate_share_edit<F>(
        total: Decimal,
        rule: SplitRule,
        include_self: bool,
        siblings: &[ShareSnapshot],
        edited: &ShareSnapshot,
        is_registered: F,
    ) -> Result<Option<Decimal>, SplitError>
    where
        F: Fn(&str) -> bool,
    {
        Self::validate_edited_identity(siblings, edited, is_registered)?;

        let external: Decimal = siblings
            .iter()
            .chain(std::iter::once(edited))
            .filter(|s| !s.is_owner_share)
            .map(|s| s.amount)
            .sum();

        if rule == SplitRule::Percentage && include_self && external >= total {
            return Err(SplitError::ShareOverflow { external, total });
        }

        let absorbs = include_self
            && !edited.is_owner_share
            && siblings.iter().any(|s| s.is_owner_share);
        if absorbs {
            return Ok(Some(total - external));
        }

        let new_sum = siblings.iter().map(|s| s.amount).sum::<Decimal>() + edited.amount;
        if !within_tolerance(new_sum, total) {
            return Err(SplitError::InvariantViolated {
                expected: total,
                actual: new_sum,
            });
        }

        Ok(None)
    }

    fn validate_edited_identity<F>(
        siblings: &[ShareSnapshot],
        edited: &ShareSnapshot,
        is_registered: F,
    ) -> Result<(), SplitError>
    where
        F: Fn(&str) -> bool,
    {
        let username = edited.username.as_deref().map(str::trim).filter(|v| !v.is_empty());
        let email = edited.email.as_deref().map(str::trim).filter(|v| !v.is_empty());

        let mut issues = Vec::new();

        if username.is_none() && email.is_none() {
            issues.push(ParticipantIssue::new("username", IssueKind::MissingIdentity));
        }

        if let Some(username) = username {
            if siblings.iter().any(|s| s.username.as_deref() == Some(username)) {
                issues.push(ParticipantIssue::new(
                    "username",
                    IssueKind::DuplicateIdentity {
                        field: "username",
                        value: username.to_string(),
                    },
                ));
            } else if !edited.is_owner_share && !is_registered(username) {
                issues.push(ParticipantIssue::new(
                    "username",
                    IssueKind::UnregisteredUsername {
                        username: username.to_string(),
                    },
                ));
            }
        }

        if let Some(email) = email {
            if siblings.iter().any(|s| s.email.as_deref() == Some(email)) {
                issues.push(ParticipantIssue::new(
                    "email",
                    IssueKind::DuplicateIdentity {
                        field: "email",
                        value: email.to_string(),
                    },
                ));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(SplitError::InvalidParticipants(issues))
        }
    }

    /// The owner's share row is always paid.
    ///
    /// # Errors
    ///
    /// Returns `OwnerShareAlwaysPaid` when unpaying the owner's row.
    pub fn validate_paid_toggle(is_owner_share: bool, paid: bool) -> Result<(), SplitError> {
        if is_owner_share && !paid {
            return Err(SplitError::OwnerShareAlwaysPaid);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use splitledger_shared::types::UserId;

    fn owner() -> OwnerIdentity {
        OwnerIdentity {
            user_id: UserId::new(),
            username: "ravi".to_string(),
            display_name: "Ravi".to_string(),
            email: Some("ravi@example.com".to_string()),
        }
    }

    fn by_username(username: &str) -> ParticipantInput {
        ParticipantInput {
            name: username.to_string(),
            username: Some(username.to_string()),
            ..ParticipantInput::default()
        }
    }

    fn by_email(email: &str) -> ParticipantInput {
        ParticipantInput {
            name: email.to_string(),
            email: Some(email.to_string()),
            ..ParticipantInput::default()
        }
    }

    fn registered(username: &str) -> bool {
        matches!(username, "asha" | "vikram" | "ravi")
    }

    fn group_header() -> ExpenseHeader {
        ExpenseHeader {
            name: "Trip".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            amount: dec!(300),
            note: None,
            expense_type: ExpenseType::Group,
            split_rule: Some(SplitRule::Equal),
            friend_count: Some(2),
            include_self: true,
        }
    }

    fn snapshot(username: Option<&str>, email: Option<&str>, amount: Decimal) -> ShareSnapshot {
        ShareSnapshot {
            id: ParticipantId::new(),
            username: username.map(str::to_string),
            email: email.map(str::to_string),
            amount,
            is_owner_share: false,
        }
    }

    // =========================================================================
    // Header and structure
    // =========================================================================

    #[test]
    fn test_header_rejects_non_positive_total() {
        let header = ExpenseHeader {
            amount: Decimal::ZERO,
            ..group_header()
        };
        assert_eq!(
            SplitValidator::validate_header(&header, 2),
            Err(SplitError::NonPositiveTotal(Decimal::ZERO))
        );
    }

    #[test]
    fn test_header_group_requires_rule_and_count() {
        let no_rule = ExpenseHeader {
            split_rule: None,
            ..group_header()
        };
        assert_eq!(
            SplitValidator::validate_header(&no_rule, 2),
            Err(SplitError::MissingSplitRule)
        );

        let no_count = ExpenseHeader {
            friend_count: None,
            ..group_header()
        };
        assert_eq!(
            SplitValidator::validate_header(&no_count, 2),
            Err(SplitError::MissingFriendCount)
        );
    }

    #[test]
    fn test_header_personal_rejects_participants() {
        let personal = ExpenseHeader {
            expense_type: ExpenseType::Personal,
            ..group_header()
        };
        assert_eq!(
            SplitValidator::validate_header(&personal, 1),
            Err(SplitError::PersonalWithParticipants)
        );
        assert!(SplitValidator::validate_header(&personal, 0).is_ok());
    }

    #[test]
    fn test_structure_requires_participants() {
        assert_eq!(
            SplitValidator::validate_structure(0, &[]),
            Err(SplitError::GroupDetailsRequired)
        );
    }

    #[test]
    fn test_structure_count_must_match_friend_count() {
        let result = SplitValidator::validate_structure(3, &[by_username("asha"), by_email("x@y.z")]);
        assert_eq!(
            result,
            Err(SplitError::ParticipantCountMismatch {
                expected: 3,
                actual: 2
            })
        );
    }

    // =========================================================================
    // Identity
    // =========================================================================

    #[test]
    fn test_identities_accept_usernames_and_emails() {
        let participants = [by_username("asha"), by_email("kiran@example.com")];
        assert!(SplitValidator::validate_identities(&participants, &owner(), true, registered).is_ok());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let participants = [by_username("asha"), by_username("asha")];
        let err = SplitValidator::validate_identities(&participants, &owner(), true, registered)
            .unwrap_err();

        assert_eq!(err.error_code(), "INVALID_PARTICIPANTS");
        assert_eq!(
            err.issues(),
            &[ParticipantIssue::new(
                "participants[1].username",
                IssueKind::DuplicateIdentity {
                    field: "username",
                    value: "asha".to_string()
                }
            )]
        );
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let participants = [by_email("kiran@example.com"), by_email("kiran@example.com")];
        let err = SplitValidator::validate_identities(&participants, &owner(), true, registered)
            .unwrap_err();

        assert_eq!(err.issues()[0].field, "participants[1].email");
        assert_eq!(err.issues()[0].kind.error_code(), "DUPLICATE_IDENTITY");
    }

    #[test]
    fn test_owner_identity_taken_when_included() {
        let participants = [by_username("ravi")];

        let err = SplitValidator::validate_identities(&participants, &owner(), true, registered)
            .unwrap_err();
        assert_eq!(err.issues()[0].kind.error_code(), "DUPLICATE_IDENTITY");

        assert!(SplitValidator::validate_identities(&participants, &owner(), false, registered).is_ok());
    }

    #[test]
    fn test_every_bad_entry_is_reported() {
        let participants = [
            ParticipantInput {
                name: "Nobody".to_string(),
                ..ParticipantInput::default()
            },
            by_username("ghost"),
            by_username("asha"),
        ];
        let err = SplitValidator::validate_identities(&participants, &owner(), true, registered)
            .unwrap_err();

        let codes: Vec<_> = err.issues().iter().map(|i| i.kind.error_code()).collect();
        assert_eq!(codes, vec!["MISSING_IDENTITY", "UNREGISTERED_USERNAME"]);
        assert_eq!(err.issues()[1].field, "participants[1].username");
    }

    // =========================================================================
    // Percentage budget
    // =========================================================================

    #[test]
    fn test_percentage_budget_with_owner() {
        let under = [
            ParticipantInput { value: Some(dec!(60)), ..by_username("asha") },
            ParticipantInput { value: Some(dec!(39.99)), ..by_username("vikram") },
        ];
        assert!(SplitValidator::validate_percentage_budget(SplitRule::Percentage, true, &under).is_ok());

        let full = [
            ParticipantInput { value: Some(dec!(60)), ..by_username("asha") },
            ParticipantInput { value: Some(dec!(40)), ..by_username("vikram") },
        ];
        assert_eq!(
            SplitValidator::validate_percentage_budget(SplitRule::Percentage, true, &full),
            Err(SplitError::PercentageOverflow {
                total_percentage: dec!(100)
            })
        );
        assert!(SplitValidator::validate_percentage_budget(SplitRule::Percentage, false, &full).is_ok());
    }

    // =========================================================================
    // Post-hoc edits
    // =========================================================================

    #[test]
    fn test_share_edit_that_keeps_sum_is_accepted() {
        let siblings = [snapshot(Some("asha"), None, dec!(60))];
        let edited = snapshot(None, Some("kiran@example.com"), dec!(40));

        assert!(
            SplitValidator::validate_share_edit(
                dec!(100),
                SplitRule::Exact,
                false,
                &siblings,
                &edited,
                registered
            )
            .is_ok()
        );
    }

    #[test]
    fn test_share_edit_breaking_sum_is_conflict() {
        let siblings = [snapshot(Some("asha"), None, dec!(60))];
        let edited = snapshot(None, Some("kiran@example.com"), dec!(55));

        let err = SplitValidator::validate_share_edit(
            dec!(100),
            SplitRule::Exact,
            false,
            &siblings,
            &edited,
            registered,
        )
        .unwrap_err();

        assert_eq!(
            err,
            SplitError::InvariantViolated {
                expected: dec!(100),
                actual: dec!(115)
            }
        );
    }

    #[test]
    fn test_share_edit_within_tolerance_is_accepted() {
        let siblings = [snapshot(Some("asha"), None, dec!(33.33))];
        let edited = snapshot(Some("vikram"), None, dec!(66.66));

        assert!(
            SplitValidator::validate_share_edit(
                dec!(100),
                SplitRule::Equal,
                false,
                &siblings,
                &edited,
                registered
            )
            .is_ok()
        );
    }

    fn owner_row(amount: Decimal) -> ShareSnapshot {
        ShareSnapshot {
            is_owner_share: true,
            ..snapshot(Some("ravi"), None, amount)
        }
    }

    #[test]
    fn test_share_edit_with_owner_rebalances_owner_row() {
        // Exact 100 split as 40 / 35 / owner 25; the first friend now owes 45
        let siblings = [snapshot(Some("vikram"), None, dec!(35)), owner_row(dec!(25))];
        let edited = snapshot(Some("asha"), None, dec!(45));

        let owner_amount = SplitValidator::validate_share_edit(
            dec!(100),
            SplitRule::Exact,
            true,
            &siblings,
            &edited,
            registered,
        )
        .unwrap();
        assert_eq!(owner_amount, Some(dec!(20)));
    }

    #[test]
    fn test_share_edit_with_owner_may_leave_exact_owner_negative() {
        let siblings = [snapshot(Some("vikram"), None, dec!(35)), owner_row(dec!(25))];
        let edited = snapshot(Some("asha"), None, dec!(80));

        let owner_amount = SplitValidator::validate_share_edit(
            dec!(100),
            SplitRule::Exact,
            true,
            &siblings,
            &edited,
            registered,
        )
        .unwrap();
        assert_eq!(owner_amount, Some(dec!(-15)));
    }

    #[test]
    fn test_share_edit_percentage_with_owner_rebalances() {
        let siblings = [snapshot(Some("asha"), None, dec!(50)), owner_row(dec!(120))];
        let edited = snapshot(Some("vikram"), None, dec!(60));

        let owner_amount = SplitValidator::validate_share_edit(
            dec!(200),
            SplitRule::Percentage,
            true,
            &siblings,
            &edited,
            registered,
        )
        .unwrap();
        assert_eq!(owner_amount, Some(dec!(90)));
    }

    #[test]
    fn test_share_edit_of_owner_row_keeps_sum_check() {
        let siblings = [
            snapshot(Some("asha"), None, dec!(40)),
            snapshot(Some("vikram"), None, dec!(35)),
        ];
        let edited = owner_row(dec!(30));

        let err = SplitValidator::validate_share_edit(
            dec!(100),
            SplitRule::Exact,
            true,
            &siblings,
            &edited,
            registered,
        )
        .unwrap_err();
        assert_eq!(
            err,
            SplitError::InvariantViolated {
                expected: dec!(100),
                actual: dec!(105)
            }
        );
    }

    #[test]
    fn test_share_edit_percentage_overflow_with_owner() {
        let siblings = [snapshot(Some("asha"), None, dec!(60)), owner_row(dec!(-10))];
        let edited = snapshot(Some("vikram"), None, dec!(50));

        let err = SplitValidator::validate_share_edit(
            dec!(100),
            SplitRule::Percentage,
            true,
            &siblings,
            &edited,
            registered,
        )
        .unwrap_err();

        assert_eq!(
            err,
            SplitError::ShareOverflow {
                external: dec!(110),
                total: dec!(100)
            }
        );
    }

    #[test]
    fn test_share_edit_duplicate_and_unregistered_username() {
        let siblings = [snapshot(Some("asha"), None, dec!(50))];

        let dup = snapshot(Some("asha"), None, dec!(50));
        let err = SplitValidator::validate_share_edit(
            dec!(100),
            SplitRule::Equal,
            false,
            &siblings,
            &dup,
            registered,
        )
        .unwrap_err();
        assert_eq!(err.issues()[0].kind.error_code(), "DUPLICATE_IDENTITY");

        let ghost = snapshot(Some("ghost"), None, dec!(50));
        let err = SplitValidator::validate_share_edit(
            dec!(100),
            SplitRule::Equal,
            false,
            &siblings,
            &ghost,
            registered,
        )
        .unwrap_err();
        assert_eq!(err.issues()[0].kind.error_code(), "UNREGISTERED_USERNAME");
    }

    #[test]
    fn test_share_edit_requires_identity() {
        let siblings = [snapshot(Some("asha"), None, dec!(50))];
        let anonymous = snapshot(None, Some("  "), dec!(50));

        let err = SplitValidator::validate_share_edit(
            dec!(100),
            SplitRule::Equal,
            false,
            &siblings,
            &anonymous,
            registered,
        )
        .unwrap_err();
        assert_eq!(err.issues()[0].kind, IssueKind::MissingIdentity);
    }

    #[test]
    fn test_owner_share_cannot_be_unpaid() {
        assert_eq!(
            SplitValidator::validate_paid_toggle(true, false),
            Err(SplitError::OwnerShareAlwaysPaid)
        );
        assert!(SplitValidator::validate_paid_toggle(true, true).is_ok());
        assert!(SplitValidator::validate_paid_toggle(false, false).is_ok());
    }
}
