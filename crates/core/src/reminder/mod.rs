//! Payment reminders for group expenses.
//!
//! Planning and scan windows, message rendering, and the delivery seam.
//! Reminders only read ledger state; they never touch amounts.

pub mod error;
pub mod message;
pub mod schedule;
pub mod sink;

pub use error::ReminderError;
pub use message::{ReminderContext, ReminderMessage};
pub use schedule::{NotificationState, ReminderKind, ReminderPlan, resolve_due_at};
pub use sink::{DispatchReport, ReminderSink, dispatch};
