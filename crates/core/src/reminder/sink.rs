//! Reminder delivery.

use std::future::Future;

use super::error::ReminderError;
use super::message::ReminderMessage;

/// Delivery channel for rendered reminders.
///
/// Implemented outside the core crate (email transport, log sink, test
/// recorder).
pub trait ReminderSink: Send + Sync {
    /// Delivers one message.
    fn deliver(
        &self,
        message: &ReminderMessage,
    ) -> impl Future<Output = Result<(), ReminderError>> + Send;
}

/// Outcome of a dispatch run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Number of messages delivered.
    pub delivered: usize,
    /// Messages that could not be rendered or delivered.
    pub failed: Vec<ReminderError>,
}

impl DispatchReport {
    /// Returns true if at least one message went out.
    #[must_use]
    pub const fn any_delivered(&self) -> bool {
        self.delivered > 0
    }
}

/// Sends every rendered message through `sink`, collecting failures instead
/// of stopping at the first one.
pub async fn dispatch<S: ReminderSink>(
    sink: &S,
    messages: Vec<Result<ReminderMessage, ReminderError>>,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    for message in messages {
        let outcome = match message {
            Ok(message) => sink.deliver(&message).await,
            Err(err) => Err(err),
        };
        match outcome {
            Ok(()) => report.delivered += 1,
            Err(err) => report.failed.push(err),
        }
    }

    report
}
