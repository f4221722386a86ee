//! Split domain types.
//!
//! These types describe an expense header, the participant declarations a
//! caller submits, and the share rows the calculator produces from them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use splitledger_shared::types::UserId;

/// Note attached to the owner's synthetic share row.
pub const OWNER_SHARE_NOTE: &str = "Owner's share";

/// Scale at which declared exact amounts and percentages are kept.
pub const DECLARED_VALUE_SCALE: u32 = 4;

/// Whether an expense is carried by the owner alone or shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseType {
    /// Paid and owed entirely by the owner.
    Personal,
    /// Shared with participants according to a split rule.
    Group,
}

impl ExpenseType {
    /// Returns the stored name of the expense type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Group => "group",
        }
    }
}

/// Algorithm dividing a group expense across its participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitRule {
    /// Everybody, the owner included when present, pays the same amount.
    Equal,
    /// Each participant declares the amount they owe.
    Exact,
    /// Each participant declares a percentage of the total.
    Percentage,
}

impl SplitRule {
    /// Returns the stored name of the split rule.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Exact => "exact",
            Self::Percentage => "percentage",
        }
    }

    /// Returns true if participants must declare a value under this rule.
    #[must_use]
    pub const fn requires_value(&self) -> bool {
        matches!(self, Self::Exact | Self::Percentage)
    }
}

/// The expense owner, threaded explicitly through every split operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerIdentity {
    /// Owner's user id.
    pub user_id: UserId,
    /// Owner's registered username.
    pub username: String,
    /// Name shown on the owner's share row.
    pub display_name: String,
    /// Owner's email, if known.
    pub email: Option<String>,
}

/// One externally supplied participant entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInput {
    /// Display name.
    pub name: String,
    /// Registered username, if the participant has an account.
    #[serde(default)]
    pub username: Option<String>,
    /// Free-form email for participants without an account.
    #[serde(default)]
    pub email: Option<String>,
    /// Exact amount or percentage, depending on the split rule.
    #[serde(default)]
    pub value: Option<Decimal>,
    /// Personal note for the participant.
    #[serde(default)]
    pub note: Option<String>,
}

impl ParticipantInput {
    /// Username with surrounding whitespace removed, if non-empty.
    #[must_use]
    pub fn username_key(&self) -> Option<&str> {
        non_blank(self.username.as_deref())
    }

    /// Email with surrounding whitespace removed, if non-empty.
    #[must_use]
    pub fn email_key(&self) -> Option<&str> {
        non_blank(self.email.as_deref())
    }

    /// Returns the declaration as it would be stored under `rule`.
    ///
    /// Blank identities become `None`, the declared value is dropped for
    /// equal splits and kept at [`DECLARED_VALUE_SCALE`] otherwise.
    #[must_use]
    pub fn normalized(&self, rule: SplitRule) -> Self {
        Self {
            name: self.name.trim().to_string(),
            username: self.username_key().map(str::to_string),
            email: self.email_key().map(str::to_string),
            value: if rule.requires_value() {
                self.value.map(|v| v.round_dp(DECLARED_VALUE_SCALE))
            } else {
                None
            },
            note: non_blank(self.note.as_deref()).map(str::to_string),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Expense header fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseHeader {
    /// Expense name.
    pub name: String,
    /// Date the expense was incurred.
    pub date: NaiveDate,
    /// Total amount.
    pub amount: Decimal,
    /// Free-form note.
    pub note: Option<String>,
    /// Personal or group.
    pub expense_type: ExpenseType,
    /// Split rule; only meaningful for group expenses.
    pub split_rule: Option<SplitRule>,
    /// Declared number of external participants; group only.
    pub friend_count: Option<u32>,
    /// Whether the owner takes a share of a group expense.
    pub include_self: bool,
}

impl ExpenseHeader {
    /// Returns the header as it is persisted.
    ///
    /// Personal expenses carry neither a split rule nor a friend count.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        if self.expense_type == ExpenseType::Personal {
            self.split_rule = None;
            self.friend_count = None;
        }
        self
    }

    /// Returns true for group expenses.
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.expense_type == ExpenseType::Group
    }
}

/// Partial header update. `None` keeps the stored value; an empty note
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderPatch {
    /// New name.
    pub name: Option<String>,
    /// New date.
    pub date: Option<NaiveDate>,
    /// New total amount.
    pub amount: Option<Decimal>,
    /// New note.
    pub note: Option<String>,
    /// New expense type.
    pub expense_type: Option<ExpenseType>,
    /// New split rule.
    pub split_rule: Option<SplitRule>,
    /// New friend count.
    pub friend_count: Option<u32>,
    /// New include-self flag.
    pub include_self: Option<bool>,
}

impl HeaderPatch {
    /// Merges the patch over `current`, producing the normalized header.
    #[must_use]
    pub fn merge(&self, current: &ExpenseHeader) -> ExpenseHeader {
        ExpenseHeader {
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            date: self.date.unwrap_or(current.date),
            amount: self.amount.unwrap_or(current.amount),
            note: match self.note.as_deref().map(str::trim) {
                Some("") => None,
                Some(note) => Some(note.to_string()),
                None => current.note.clone(),
            },
            expense_type: self.expense_type.unwrap_or(current.expense_type),
            split_rule: self.split_rule.or(current.split_rule),
            friend_count: self.friend_count.or(current.friend_count),
            include_self: self.include_self.unwrap_or(current.include_self),
        }
        .normalized()
    }
}

/// A materialized share, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareDraft {
    /// Display name.
    pub name: String,
    /// Registered username, if any.
    pub username: Option<String>,
    /// Email, if any.
    pub email: Option<String>,
    /// Declared exact amount or percentage the share was computed from.
    pub declared_value: Option<Decimal>,
    /// Computed share of the total.
    pub amount: Decimal,
    /// Personal note.
    pub note: Option<String>,
    /// Whether the share has been settled.
    pub is_paid: bool,
    /// Whether this is the owner's synthetic row.
    pub is_owner_share: bool,
}

impl ShareDraft {
    /// Builds the owner's synthetic share row.
    #[must_use]
    pub fn owner(owner: &OwnerIdentity, amount: Decimal) -> Self {
        Self {
            name: owner.display_name.clone(),
            username: Some(owner.username.clone()),
            email: owner.email.clone(),
            declared_value: None,
            amount,
            note: Some(OWNER_SHARE_NOTE.to_string()),
            is_paid: true,
            is_owner_share: true,
        }
    }

    /// Builds an unpaid external share from its declaration.
    #[must_use]
    pub fn external(input: &ParticipantInput, amount: Decimal) -> Self {
        Self {
            name: input.name.clone(),
            username: input.username.clone(),
            email: input.email.clone(),
            declared_value: input.value,
            amount,
            note: input.note.clone(),
            is_paid: false,
            is_owner_share: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn header() -> ExpenseHeader {
        ExpenseHeader {
            name: "Dinner".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            amount: dec!(300),
            note: None,
            expense_type: ExpenseType::Group,
            split_rule: Some(SplitRule::Equal),
            friend_count: Some(2),
            include_self: true,
        }
    }

    #[test]
    fn test_personal_header_drops_split_fields() {
        let personal = ExpenseHeader {
            expense_type: ExpenseType::Personal,
            ..header()
        }
        .normalized();

        assert_eq!(personal.split_rule, None);
        assert_eq!(personal.friend_count, None);
    }

    #[test]
    fn test_patch_merge_keeps_unset_fields() {
        let patch = HeaderPatch {
            amount: Some(dec!(450)),
            ..HeaderPatch::default()
        };
        let merged = patch.merge(&header());

        assert_eq!(merged.amount, dec!(450));
        assert_eq!(merged.name, "Dinner");
        assert_eq!(merged.split_rule, Some(SplitRule::Equal));
        assert!(merged.include_self);
    }

    #[test]
    fn test_patch_merge_clears_note_with_empty_string() {
        let noted = ExpenseHeader {
            note: Some("hotel".to_string()),
            ..header()
        };

        let cleared = HeaderPatch {
            note: Some("  ".to_string()),
            ..HeaderPatch::default()
        }
        .merge(&noted);
        assert_eq!(cleared.note, None);

        let kept = HeaderPatch::default().merge(&noted);
        assert_eq!(kept.note.as_deref(), Some("hotel"));

        let replaced = HeaderPatch {
            note: Some(" flights ".to_string()),
            ..HeaderPatch::default()
        }
        .merge(&noted);
        assert_eq!(replaced.note.as_deref(), Some("flights"));
    }

    #[test]
    fn test_participant_normalization() {
        let input = ParticipantInput {
            name: " Asha ".to_string(),
            username: Some("  ".to_string()),
            email: Some(" asha@example.com ".to_string()),
            value: Some(dec!(12.345678)),
            note: Some(String::new()),
        };

        let exact = input.normalized(SplitRule::Exact);
        assert_eq!(exact.name, "Asha");
        assert_eq!(exact.username, None);
        assert_eq!(exact.email.as_deref(), Some("asha@example.com"));
        assert_eq!(exact.value, Some(dec!(12.3457)));
        assert_eq!(exact.note, None);

        assert_eq!(input.normalized(SplitRule::Equal).value, None);
    }

    #[test]
    fn test_owner_share_row() {
        let owner = OwnerIdentity {
            user_id: UserId::new(),
            username: "ravi".to_string(),
            display_name: "Ravi".to_string(),
            email: None,
        };
        let row = ShareDraft::owner(&owner, dec!(100));

        assert!(row.is_paid);
        assert!(row.is_owner_share);
        assert_eq!(row.note.as_deref(), Some(OWNER_SHARE_NOTE));
        assert_eq!(row.username.as_deref(), Some("ravi"));
    }
}
