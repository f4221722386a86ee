//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod expense;
pub mod notification;
pub mod settlement;
pub mod user;

pub use expense::{
    CreateExpenseInput, ExpenseRepository, ExpenseWithShares, LedgerError, UpdateExpenseInput,
    UpdateParticipantInput,
};
pub use notification::{
    NotificationError, NotificationRepository, ReminderBatch, ScheduleReminderInput,
};
pub use settlement::{SettlementError, SettlementRepository};
pub use user::UserRepository;
