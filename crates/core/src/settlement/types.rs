//! Settlement domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use splitledger_shared::types::{ExpenseId, ParticipantId};

use crate::split::ExpenseType;

/// A committed expense with its share rows, as read from the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseRecord {
    /// Expense id.
    pub id: ExpenseId,
    /// Date incurred.
    pub date: NaiveDate,
    /// Expense name.
    pub name: String,
    /// Total amount.
    pub amount: Decimal,
    /// Free-form note.
    pub note: Option<String>,
    /// Personal or group.
    pub expense_type: ExpenseType,
    /// Share rows in display order; empty for personal expenses.
    pub shares: Vec<ShareRecord>,
}

/// A committed share row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRecord {
    /// Row id.
    pub id: ParticipantId,
    /// Display name.
    pub name: String,
    /// Registered username, if any.
    pub username: Option<String>,
    /// Email, if any.
    pub email: Option<String>,
    /// Share amount.
    pub amount: Decimal,
    /// Personal note.
    pub note: Option<String>,
    /// Whether the share has been settled.
    pub is_paid: bool,
    /// Whether this is the owner's synthetic row.
    pub is_owner_share: bool,
}

impl ShareRecord {
    /// Returns true if the row belongs to the owner, either as the synthetic
    /// owner row or by carrying the owner's username.
    #[must_use]
    pub fn belongs_to(&self, owner_username: &str) -> bool {
        self.is_owner_share || self.username.as_deref() == Some(owner_username)
    }
}

/// One line of the balance sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceLine {
    /// Expense the line comes from.
    pub expense_id: ExpenseId,
    /// Share row the line comes from; `None` for personal expenses.
    pub participant_id: Option<ParticipantId>,
    /// Date incurred.
    pub date: NaiveDate,
    /// Expense name.
    pub name: String,
    /// Participant name; `None` for personal expenses.
    pub participant_name: Option<String>,
    /// Expense total (personal) or share amount (group).
    pub amount: Decimal,
    /// Personal or group.
    pub origin: ExpenseType,
    /// Expense note.
    pub note: Option<String>,
    /// Amount the owner has paid on this line.
    pub paid: Decimal,
    /// Amount still owed to the owner on this line.
    pub owed: Decimal,
}

/// Per-user balance sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BalanceSheet {
    /// One line per personal expense.
    pub personal_expenses: Vec<BalanceLine>,
    /// One line per share row of each group expense.
    pub group_expenses: Vec<BalanceLine>,
    /// Sum of `paid` across all lines.
    pub total_paid: Decimal,
    /// Sum of `owed` across all lines.
    pub total_owed: Decimal,
}

/// Settlement figures across the share rows of group expenses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    /// Sum of paid share rows, owner's rows included.
    pub payments_received: Decimal,
    /// Sum of unpaid share rows.
    pub payments_pending: Decimal,
    /// Number of paid share rows.
    pub paid_count: u64,
    /// Number of unpaid share rows.
    pub unpaid_count: u64,
    /// Group expense totals minus the owner's own shares.
    pub total_group_spend: Decimal,
}

/// Account-wide expense summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PortfolioSummary {
    /// Number of personal expenses.
    pub personal_expense_count: u64,
    /// Number of group expenses.
    pub group_expense_count: u64,
    /// Sum of personal expense totals.
    pub personal_expense_sum: Decimal,
    /// Sum of group expense totals.
    pub group_expense_sum: Decimal,
    /// Settlement figures for group expenses.
    pub group_expense_summary: GroupSummary,
    /// Personal plus group expense totals.
    pub total_expense_sum: Decimal,
}

/// An unpaid share owed to the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnpaidShare {
    /// Share row id.
    pub participant_id: ParticipantId,
    /// Expense id.
    pub expense_id: ExpenseId,
    /// Expense name.
    pub expense_name: String,
    /// Expense note.
    pub expense_note: Option<String>,
    /// Participant name.
    pub name: String,
    /// Registered username, if any.
    pub username: Option<String>,
    /// Email, if any.
    pub email: Option<String>,
    /// Amount owed.
    pub amount: Decimal,
    /// Personal note.
    pub note: Option<String>,
}
