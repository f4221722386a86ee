//! Reminder errors.

use chrono::{NaiveDate, NaiveTime};
use splitledger_shared::types::ParticipantId;
use thiserror::Error;

/// Errors raised while planning or delivering reminders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReminderError {
    /// The due date and time do not exist in the configured timezone.
    #[error("Due time {date} {time} does not exist in timezone {timezone}")]
    InvalidDueTime {
        /// Due date.
        date: NaiveDate,
        /// Due time.
        time: NaiveTime,
        /// Timezone name.
        timezone: String,
    },

    /// Reminders only apply to group expenses.
    #[error("Reminders can only be scheduled for group expenses")]
    NotGroupExpense,

    /// No email is known for an unpaid participant.
    #[error("No email address known for participant {name} ({participant_id})")]
    MissingRecipientEmail {
        /// Share row id.
        participant_id: ParticipantId,
        /// Participant name.
        name: String,
    },

    /// The sink failed to deliver a message.
    #[error("Reminder delivery failed: {0}")]
    Delivery(String),
}

impl ReminderError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDueTime { .. } => "INVALID_DUE_TIME",
            Self::NotGroupExpense => "NOT_GROUP_EXPENSE",
            Self::MissingRecipientEmail { .. } => "MISSING_RECIPIENT_EMAIL",
            Self::Delivery(_) => "DELIVERY_FAILED",
        }
    }
}
