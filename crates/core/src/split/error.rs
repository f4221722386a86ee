//! Split calculation and validation errors.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Broad class of a split failure, used to pick the client-facing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitErrorCategory {
    /// Malformed or inconsistent input.
    Validation,
    /// The state an edit would produce breaks an invariant.
    Conflict,
}

/// Problem found with one participant entry's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    /// Neither username nor email was supplied.
    MissingIdentity,
    /// The username or email already appears in the same expense.
    DuplicateIdentity {
        /// `"username"` or `"email"`.
        field: &'static str,
        /// The repeated value.
        value: String,
    },
    /// The username does not belong to a registered account.
    UnregisteredUsername {
        /// The unknown username.
        username: String,
    },
}

impl IssueKind {
    /// Returns the error code for this issue.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingIdentity => "MISSING_IDENTITY",
            Self::DuplicateIdentity { .. } => "DUPLICATE_IDENTITY",
            Self::UnregisteredUsername { .. } => "UNREGISTERED_USERNAME",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingIdentity => write!(f, "either username or email must be provided"),
            Self::DuplicateIdentity { field, value } => {
                write!(f, "duplicate entry found for {field} '{value}'")
            }
            Self::UnregisteredUsername { username } => write!(
                f,
                "username '{username}' is not registered, provide an email address instead"
            ),
        }
    }
}

/// Identity problem attached to the request field it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantIssue {
    /// Request field path, e.g. `participants[1].username`.
    pub field: String,
    /// What is wrong with it.
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl ParticipantIssue {
    /// Creates an issue for the given field path.
    #[must_use]
    pub fn new(field: impl Into<String>, kind: IssueKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

impl fmt::Display for ParticipantIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.kind)
    }
}

/// Errors raised while validating or calculating a split.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    // ========== Header Errors ==========
    /// Expense total must be strictly positive.
    #[error("Expense amount must be greater than zero, got {0}")]
    NonPositiveTotal(Decimal),

    /// Group expense without a split rule.
    #[error("Split rule is required for group expenses")]
    MissingSplitRule,

    /// Group expense without a friend count.
    #[error("Friend count is required for group expenses")]
    MissingFriendCount,

    /// Personal expense submitted with participants.
    #[error("Personal expenses cannot have participants")]
    PersonalWithParticipants,

    // ========== Structural Errors ==========
    /// Group expense without any participant.
    #[error("Group expense details are required for group expenses")]
    GroupDetailsRequired,

    /// Participant count does not match the declared friend count.
    #[error("Number of participants ({actual}) does not match friend count ({expected})")]
    ParticipantCountMismatch {
        /// Declared friend count.
        expected: u32,
        /// Participants supplied.
        actual: usize,
    },

    // ========== Value Errors ==========
    /// Exact or percentage split without a declared value.
    #[error("Participant {index} is missing an amount")]
    MissingAmount {
        /// Position of the participant in the request.
        index: usize,
    },

    /// Declared exact amount is negative.
    #[error("Participant {index} has a negative amount: {value}")]
    NegativeAmount {
        /// Position of the participant in the request.
        index: usize,
        /// The declared amount.
        value: Decimal,
    },

    /// Declared percentage is outside 0..=100.
    #[error("Participant {index} has a percentage outside 0-100: {value}")]
    PercentageOutOfRange {
        /// Position of the participant in the request.
        index: usize,
        /// The declared percentage.
        value: Decimal,
    },

    /// Declared values do not add up to the total (or to 100%).
    #[error("Split does not add up: expected {expected}, got {actual}")]
    SplitMismatch {
        /// Total amount, or 100 for percentages.
        expected: Decimal,
        /// Sum of the declared values.
        actual: Decimal,
    },

    /// External percentages leave nothing for the owner.
    #[error("Total percentage {total_percentage} must stay below 100 when including self")]
    PercentageOverflow {
        /// Sum of the external percentages.
        total_percentage: Decimal,
    },

    // ========== Identity Errors ==========
    /// One or more participant entries carry an invalid identity.
    #[error("Invalid participants: {}", join_issues(.0))]
    InvalidParticipants(Vec<ParticipantIssue>),

    // ========== Post-hoc Edit Errors ==========
    /// An edit would leave the share set inconsistent with the total.
    #[error("Shares would no longer add up: expected {expected}, got {actual}")]
    InvariantViolated {
        /// Expected sum.
        expected: Decimal,
        /// Sum after the edit.
        actual: Decimal,
    },

    /// External shares of a percentage split would consume the whole total.
    #[error("External shares ({external}) would leave nothing of {total} for the owner")]
    ShareOverflow {
        /// Sum of the non-owner shares after the edit.
        external: Decimal,
        /// Expense total.
        total: Decimal,
    },

    /// The owner's share row cannot be marked unpaid.
    #[error("The owner's share is always paid")]
    OwnerShareAlwaysPaid,
}

fn join_issues(issues: &[ParticipantIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl SplitError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveTotal(_) => "INVALID_AMOUNT",
            Self::MissingSplitRule => "MISSING_SPLIT_RULE",
            Self::MissingFriendCount => "MISSING_FRIEND_COUNT",
            Self::PersonalWithParticipants => "PERSONAL_WITH_PARTICIPANTS",
            Self::GroupDetailsRequired => "GROUP_DETAILS_REQUIRED",
            Self::ParticipantCountMismatch { .. } => "PARTICIPANT_COUNT_MISMATCH",
            Self::MissingAmount { .. } => "MISSING_AMOUNT",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::PercentageOutOfRange { .. } => "PERCENTAGE_OUT_OF_RANGE",
            Self::SplitMismatch { .. } => "SPLIT_MISMATCH",
            Self::PercentageOverflow { .. } => "PERCENTAGE_OVERFLOW",
            Self::InvalidParticipants(_) => "INVALID_PARTICIPANTS",
            Self::InvariantViolated { .. } => "INVARIANT_VIOLATED",
            Self::ShareOverflow { .. } => "SHARE_OVERFLOW",
            Self::OwnerShareAlwaysPaid => "OWNER_SHARE_ALWAYS_PAID",
        }
    }

    /// Returns the broad category of this error.
    #[must_use]
    pub const fn category(&self) -> SplitErrorCategory {
        match self {
            Self::InvariantViolated { .. }
            | Self::ShareOverflow { .. }
            | Self::OwnerShareAlwaysPaid => {
                SplitErrorCategory::Conflict
            }
            _ => SplitErrorCategory::Validation,
        }
    }

    /// Returns the request field the error points at, if any.
    #[must_use]
    pub fn field(&self) -> Option<String> {
        match self {
            Self::NonPositiveTotal(_) => Some("amount".to_string()),
            Self::MissingSplitRule => Some("split_rule".to_string()),
            Self::MissingFriendCount | Self::ParticipantCountMismatch { .. } => {
                Some("friend_count".to_string())
            }
            Self::PersonalWithParticipants | Self::GroupDetailsRequired => {
                Some("participants".to_string())
            }
            Self::MissingAmount { index }
            | Self::NegativeAmount { index, .. }
            | Self::PercentageOutOfRange { index, .. } => {
                Some(format!("participants[{index}].value"))
            }
            _ => None,
        }
    }

    /// Returns the per-participant issues carried by this error.
    #[must_use]
    pub fn issues(&self) -> &[ParticipantIssue] {
        match self {
            Self::InvalidParticipants(issues) => issues,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_edit_failures_are_conflicts() {
        let err = SplitError::InvariantViolated {
            expected: dec!(100),
            actual: dec!(120),
        };
        assert_eq!(err.category(), SplitErrorCategory::Conflict);
        assert_eq!(err.error_code(), "INVARIANT_VIOLATED");
        assert_eq!(
            SplitError::OwnerShareAlwaysPaid.category(),
            SplitErrorCategory::Conflict
        );
    }

    #[test]
    fn test_input_failures_are_validation() {
        let err = SplitError::SplitMismatch {
            expected: dec!(100),
            actual: dec!(110),
        };
        assert_eq!(err.category(), SplitErrorCategory::Validation);
        assert_eq!(err.error_code(), "SPLIT_MISMATCH");
    }

    #[test]
    fn test_value_errors_point_at_participant_field() {
        let err = SplitError::MissingAmount { index: 2 };
        assert_eq!(err.field().as_deref(), Some("participants[2].value"));
    }

    #[test]
    fn test_invalid_participants_message_lists_every_issue() {
        let err = SplitError::InvalidParticipants(vec![
            ParticipantIssue::new("participants[0].username", IssueKind::MissingIdentity),
            ParticipantIssue::new(
                "participants[1].username",
                IssueKind::UnregisteredUsername {
                    username: "ghost".to_string(),
                },
            ),
        ]);

        let message = err.to_string();
        assert!(message.contains("participants[0].username"));
        assert!(message.contains("'ghost' is not registered"));
        assert_eq!(err.issues().len(), 2);
    }
}
