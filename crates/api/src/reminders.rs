//! Reminder runner.
//!
//! Fires due reminders found by the periodic scan and the immediate reminder
//! sent when a schedule is enabled. Delivery goes through a `ReminderSink`;
//! the server uses [`TracingReminderSink`], which records each message in
//! the log instead of sending email.

use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sea_orm::DatabaseConnection;
use splitledger_core::reminder::{
    DispatchReport, ReminderContext, ReminderError, ReminderKind, ReminderMessage, ReminderSink,
    dispatch,
};
use splitledger_db::entities::expense_notifications;
use splitledger_db::repositories::{NotificationError, NotificationRepository};
use tracing::{error, info, warn};

/// Sink that logs every reminder.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReminderSink;

impl ReminderSink for TracingReminderSink {
    async fn deliver(&self, message: &ReminderMessage) -> Result<(), ReminderError> {
        info!(
            to = %message.to,
            recipient = %message.recipient_name,
            kind = message.kind.label(),
            subject = %message.subject,
            "Reminder dispatched"
        );
        Ok(())
    }
}

/// Outcome of one scan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    /// Schedules that had a reminder due.
    pub fired: usize,
    /// Messages delivered.
    pub delivered: usize,
    /// Messages that failed to render or deliver.
    pub failed: usize,
}

/// Runs reminder scans and immediate reminders against the ledger.
#[derive(Debug)]
pub struct ReminderRunner<S> {
    repo: NotificationRepository,
    sink: S,
    tz: Tz,
}

impl<S: ReminderSink> ReminderRunner<S> {
    /// Creates a runner delivering through `sink`.
    #[must_use]
    pub const fn new(db: DatabaseConnection, sink: S, tz: Tz) -> Self {
        Self {
            repo: NotificationRepository::new(db),
            sink,
            tz,
        }
    }

    /// Fires every reminder whose window is open at `now`.
    ///
    /// A reminder is claimed before it is sent, so a crash between the two
    /// drops it rather than sending it twice.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan query fails. Failures for individual
    /// schedules are logged and skipped.
    pub async fn scan_once(&self, now: DateTime<Utc>) -> Result<ScanReport, NotificationError> {
        let mut report = ScanReport::default();

        for notification in self.repo.find_due(now).await? {
            let Some(kind) = notification.state().pending(now) else {
                continue;
            };

            match self.repo.mark_sent(notification.id, kind).await {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    error!(notification_id = %notification.id, error = %e, "Failed to claim reminder");
                    continue;
                }
            }

            match self.send(&notification, kind).await {
                Ok(sent) => {
                    report.fired += 1;
                    report.delivered += sent.delivered;
                    report.failed += sent.failed.len();
                }
                Err(e) => {
                    error!(expense_id = %notification.expense_id, error = %e, "Failed to send reminders");
                }
            }
        }

        Ok(report)
    }

    /// Sends the immediate reminder for a freshly enabled schedule.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub async fn send_immediate(
        &self,
        notification: &expense_notifications::Model,
    ) -> Result<DispatchReport, NotificationError> {
        self.send(notification, ReminderKind::Immediate).await
    }

    async fn send(
        &self,
        notification: &expense_notifications::Model,
        kind: ReminderKind,
    ) -> Result<DispatchReport, NotificationError> {
        let Some(batch) = self.repo.reminder_batch(notification.expense_id).await? else {
            return Ok(DispatchReport::default());
        };

        let ctx = ReminderContext {
            expense_name: batch.expense.expense.name.clone(),
            expense_note: batch.expense.expense.note.clone(),
            due_local: notification.due_at.with_timezone(&self.tz),
            sender_name: batch.owner.display_name().to_string(),
        };
        let messages = ReminderMessage::render_all(kind, &ctx, &batch.unpaid, |username| {
            batch.directory.get(username).cloned()
        });

        let report = dispatch(&self.sink, messages).await;
        for failure in &report.failed {
            warn!(
                expense_id = %notification.expense_id,
                code = failure.error_code(),
                error = %failure,
                "Reminder not delivered"
            );
        }
        info!(
            expense_id = %notification.expense_id,
            kind = kind.label(),
            delivered = report.delivered,
            failed = report.failed.len(),
            "Reminders sent"
        );

        Ok(report)
    }

    /// Scans every `interval` until the task is dropped.
    pub async fn run(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match self.scan_once(Utc::now()).await {
                Ok(report) if report.fired > 0 => {
                    info!(fired = report.fired, delivered = report.delivered, "Reminder scan finished");
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "Reminder scan failed"),
            }
        }
    }
}
