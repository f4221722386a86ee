//! Settlement rollups over an owner's expenses.
//!
//! Balance sheet, portfolio summary and unpaid list, all derived from
//! committed ledger state at query time.

pub mod service;
pub mod types;

pub use service::SettlementService;
pub use types::{
    BalanceLine, BalanceSheet, ExpenseRecord, GroupSummary, PortfolioSummary, ShareRecord,
    UnpaidShare,
};
