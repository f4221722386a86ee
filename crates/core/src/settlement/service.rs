//! Settlement aggregation over an owner's expenses.
//!
//! Every rollup is computed from the records passed in; nothing is cached.

use rust_decimal::Decimal;

use super::types::{
    BalanceLine, BalanceSheet, ExpenseRecord, GroupSummary, PortfolioSummary, ShareRecord,
    UnpaidShare,
};
use crate::split::ExpenseType;

/// Read-only settlement aggregator.
pub struct SettlementService;

impl SettlementService {
    /// Builds the owner's balance sheet.
    ///
    /// Personal expenses are paid in full by the owner. For group expenses
    /// the owner's own row counts as paid when settled, and every other
    /// unpaid row counts as owed to the owner.
    #[must_use]
    pub fn balance_sheet(owner_username: &str, expenses: &[ExpenseRecord]) -> BalanceSheet {
        let mut sheet = BalanceSheet::default();

        for expense in expenses {
            match expense.expense_type {
                ExpenseType::Personal => {
                    sheet.total_paid += expense.amount;
                    sheet.personal_expenses.push(BalanceLine {
                        expense_id: expense.id,
                        participant_id: None,
                        date: expense.date,
                        name: expense.name.clone(),
                        participant_name: None,
                        amount: expense.amount,
                        origin: ExpenseType::Personal,
                        note: expense.note.clone(),
                        paid: expense.amount,
                        owed: Decimal::ZERO,
                    });
                }
                ExpenseType::Group => {
                    for share in &expense.shares {
                        let line = Self::group_line(owner_username, expense, share);
                        sheet.total_paid += line.paid;
                        sheet.total_owed += line.owed;
                        sheet.group_expenses.push(line);
                    }
                }
            }
        }

        sheet
    }

    fn group_line(owner_username: &str, expense: &ExpenseRecord, share: &ShareRecord) -> BalanceLine {
        let (paid, owed) = match (share.belongs_to(owner_username), share.is_paid) {
            (true, true) => (share.amount, Decimal::ZERO),
            (false, false) => (Decimal::ZERO, share.amount),
            _ => (Decimal::ZERO, Decimal::ZERO),
        };

        BalanceLine {
            expense_id: expense.id,
            participant_id: Some(share.id),
            date: expense.date,
            name: expense.name.clone(),
            participant_name: Some(share.name.clone()),
            amount: share.amount,
            origin: ExpenseType::Group,
            note: expense.note.clone(),
            paid,
            owed,
        }
    }

    /// Summarizes counts and sums across the owner's expenses.
    #[must_use]
    pub fn portfolio_summary(owner_username: &str, expenses: &[ExpenseRecord]) -> PortfolioSummary {
        let mut summary = PortfolioSummary::default();
        let mut owner_share = Decimal::ZERO;

        for expense in expenses {
            match expense.expense_type {
                ExpenseType::Personal => {
                    summary.personal_expense_count += 1;
                    summary.personal_expense_sum += expense.amount;
                }
                ExpenseType::Group => {
                    summary.group_expense_count += 1;
                    summary.group_expense_sum += expense.amount;

                    let group = &mut summary.group_expense_summary;
                    for share in &expense.shares {
                        if share.is_paid {
                            group.payments_received += share.amount;
                            group.paid_count += 1;
                        } else {
                            group.payments_pending += share.amount;
                            group.unpaid_count += 1;
                        }
                        if share.belongs_to(owner_username) {
                            owner_share += share.amount;
                        }
                    }
                }
            }
        }

        summary.group_expense_summary.total_group_spend = summary.group_expense_sum - owner_share;
        summary.total_expense_sum = summary.personal_expense_sum + summary.group_expense_sum;
        summary
    }

    /// Lists every unpaid share not belonging to the owner.
    #[must_use]
    pub fn unpaid(owner_username: &str, expenses: &[ExpenseRecord]) -> Vec<UnpaidShare> {
        expenses
            .iter()
            .flat_map(|expense| Self::unpaid_in(owner_username, expense))
            .collect()
    }

    /// Lists the unpaid shares of one expense not belonging to the owner.
    #[must_use]
    pub fn unpaid_in(owner_username: &str, expense: &ExpenseRecord) -> Vec<UnpaidShare> {
        expense
            .shares
            .iter()
            .filter(|share| !share.is_paid && !share.belongs_to(owner_username))
            .map(|share| UnpaidShare {
                participant_id: share.id,
                expense_id: expense.id,
                expense_name: expense.name.clone(),
                expense_note: expense.note.clone(),
                name: share.name.clone(),
                username: share.username.clone(),
                email: share.email.clone(),
                amount: share.amount,
                note: share.note.clone(),
            })
            .collect()
    }
}
