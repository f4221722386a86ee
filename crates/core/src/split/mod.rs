//! Expense splitting.
//!
//! This module turns one expense plus its participant declarations into a
//! consistent set of per-participant shares:
//! - Domain types for headers, declarations and share rows
//! - Cent allocation (Largest Remainder Method)
//! - Share calculation per split rule
//! - Validation before calculation and after in-place edits
//! - Change detection for updates

pub mod allocation;
pub mod calculator;
pub mod error;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod props;

pub use calculator::SplitCalculator;
pub use error::{IssueKind, ParticipantIssue, SplitError, SplitErrorCategory};
pub use service::SplitService;
pub use types::{
    DECLARED_VALUE_SCALE, ExpenseHeader, ExpenseType, HeaderPatch, OWNER_SHARE_NOTE,
    OwnerIdentity, ParticipantInput, ShareDraft, SplitRule,
};
pub use validation::{ShareSnapshot, SplitValidator};
