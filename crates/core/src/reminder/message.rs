//! Reminder message content.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

use super::error::ReminderError;
use super::schedule::ReminderKind;
use crate::settlement::UnpaidShare;

/// Expense-level context shared by every message of one reminder run.
#[derive(Debug, Clone)]
pub struct ReminderContext {
    /// Expense name.
    pub expense_name: String,
    /// Expense note.
    pub expense_note: Option<String>,
    /// Due instant in the configured timezone.
    pub due_local: DateTime<Tz>,
    /// Name the message is signed with.
    pub sender_name: String,
}

/// A rendered reminder, ready for a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderMessage {
    /// Which reminder this is.
    pub kind: ReminderKind,
    /// Recipient email.
    pub to: String,
    /// Recipient display name.
    pub recipient_name: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

impl ReminderMessage {
    /// Renders the reminder for one unpaid share.
    #[must_use]
    pub fn render(kind: ReminderKind, ctx: &ReminderContext, share: &UnpaidShare, to: String) -> Self {
        let subject = match kind {
            ReminderKind::Immediate => format!("Payment Reminder for {}", ctx.expense_name),
            ReminderKind::TwentyFourHour | ReminderKind::OneHour => format!(
                "{} Reminder: Payment for {}",
                capitalize(kind.label()),
                ctx.expense_name
            ),
        };

        let lead = match kind {
            ReminderKind::Immediate => format!(
                "This is a reminder for your pending payment for the group expense \"{}\".",
                ctx.expense_name
            ),
            ReminderKind::TwentyFourHour | ReminderKind::OneHour => format!(
                "This is a reminder that your payment for the group expense \"{}\" is due in {}.",
                ctx.expense_name,
                kind.label()
            ),
        };

        let body = format!(
            "Dear {name},\n\
             {lead}\n\
             Details:\n\
             - Amount due: {amount}\n\
             - Due date and time: {due}\n\
             - Expense note: {expense_note}\n\
             - Your personal note: {note}\n\
             Please ensure that the payment is made by the due date and time.\n\
             Thank you for your cooperation.\n\
             Best regards,\n\
             {sender}\n",
            name = share.name,
            amount = share.amount,
            due = ctx.due_local.format("%Y-%m-%d %H:%M %Z"),
            expense_note = ctx.expense_note.as_deref().unwrap_or("-"),
            note = share.note.as_deref().unwrap_or("-"),
            sender = ctx.sender_name,
        );

        Self {
            kind,
            to,
            recipient_name: share.name.clone(),
            subject,
            body,
        }
    }

    /// Renders one message per unpaid share, resolving each recipient's
    /// address from the row itself or, failing that, from the user directory.
    ///
    /// Shares without any known address come back as errors so the caller
    /// can log them without dropping the rest.
    pub fn render_all<F>(
        kind: ReminderKind,
        ctx: &ReminderContext,
        shares: &[UnpaidShare],
        directory_email: F,
    ) -> Vec<Result<Self, ReminderError>>
    where
        F: Fn(&str) -> Option<String>,
    {
        shares
            .iter()
            .map(|share| {
                let to = share
                    .email
                    .clone()
                    .or_else(|| share.username.as_deref().and_then(&directory_email))
                    .ok_or_else(|| ReminderError::MissingRecipientEmail {
                        participant_id: share.participant_id,
                        name: share.name.clone(),
                    })?;
                Ok(Self::render(kind, ctx, share, to))
            })
            .collect()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
