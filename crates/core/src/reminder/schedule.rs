//! Reminder planning and scan windows.
//!
//! A reminder is planned when the notification is scheduled and fired by a
//! periodic scan. Planning decides which reminders exist at all; the scan
//! fires a planned reminder once its window opens.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::error::ReminderError;

/// Which reminder a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    /// Sent right away when reminders are enabled.
    Immediate,
    /// Sent about a day before the due time.
    TwentyFourHour,
    /// Sent about an hour before the due time.
    OneHour,
}

impl ReminderKind {
    /// Human-readable lead time used in message text.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::TwentyFourHour => "24 hour",
            Self::OneHour => "1 hour",
        }
    }

    /// Inclusive window of time-until-due in which the scan fires this
    /// reminder. Immediate reminders have no window.
    #[must_use]
    pub fn window(&self) -> Option<(Duration, Duration)> {
        match self {
            Self::Immediate => None,
            Self::TwentyFourHour => Some((Duration::hours(23), Duration::hours(25))),
            Self::OneHour => Some((Duration::minutes(55), Duration::minutes(65))),
        }
    }

    /// Returns the scheduled reminder whose window contains `time_until_due`.
    #[must_use]
    pub fn in_window(time_until_due: Duration) -> Option<Self> {
        [Self::TwentyFourHour, Self::OneHour].into_iter().find(|kind| {
            kind.window()
                .is_some_and(|(from, to)| from <= time_until_due && time_until_due <= to)
        })
    }
}

/// Which scheduled reminders exist for a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPlan {
    /// Whether the 24-hour reminder is planned.
    pub twenty_four_hour: bool,
    /// Whether the 1-hour reminder is planned.
    pub one_hour: bool,
}

impl ReminderPlan {
    /// Plans reminders for a due time as seen at `now`.
    ///
    /// More than 24 hours out: both reminders. Between 1 and 24 hours out:
    /// only the 1-hour reminder. Less than an hour out: none.
    #[must_use]
    pub fn for_due(now: DateTime<Utc>, due_at: DateTime<Utc>) -> Self {
        let until_due = due_at - now;
        if until_due > Duration::hours(24) {
            Self {
                twenty_four_hour: true,
                one_hour: true,
            }
        } else if until_due > Duration::hours(1) {
            Self {
                twenty_four_hour: false,
                one_hour: true,
            }
        } else {
            Self::default()
        }
    }
}

/// Reminder state of one expense notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationState {
    /// Due instant.
    pub due_at: DateTime<Utc>,
    /// Whether reminders are enabled.
    pub enabled: bool,
    /// 24-hour reminder already sent, or not planned.
    pub reminder_24h_sent: bool,
    /// 1-hour reminder already sent, or not planned.
    pub reminder_1h_sent: bool,
}

impl NotificationState {
    /// Builds the state right after scheduling: reminders left out of the
    /// plan are recorded as already settled so the scan never fires them.
    #[must_use]
    pub fn scheduled(now: DateTime<Utc>, due_at: DateTime<Utc>, enabled: bool) -> Self {
        let plan = ReminderPlan::for_due(now, due_at);
        Self {
            due_at,
            enabled,
            reminder_24h_sent: !plan.twenty_four_hour,
            reminder_1h_sent: !plan.one_hour,
        }
    }

    /// Returns the reminder the scan should fire at `now`, if any.
    #[must_use]
    pub fn pending(&self, now: DateTime<Utc>) -> Option<ReminderKind> {
        if !self.enabled || now >= self.due_at {
            return None;
        }

        match ReminderKind::in_window(self.due_at - now)? {
            ReminderKind::TwentyFourHour if !self.reminder_24h_sent => {
                Some(ReminderKind::TwentyFourHour)
            }
            ReminderKind::OneHour if !self.reminder_1h_sent => Some(ReminderKind::OneHour),
            _ => None,
        }
    }

    /// Marks `kind` as sent.
    pub fn mark_sent(&mut self, kind: ReminderKind) {
        match kind {
            ReminderKind::TwentyFourHour => self.reminder_24h_sent = true,
            ReminderKind::OneHour => self.reminder_1h_sent = true,
            ReminderKind::Immediate => {}
        }
    }
}

/// Resolves a local due date and time in `tz` to an instant.
///
/// Ambiguous local times (clocks falling back) resolve to the earlier
/// instant.
///
/// # Errors
///
/// Returns `InvalidDueTime` for local times skipped by a clock change.
pub fn resolve_due_at(date: NaiveDate, time: NaiveTime, tz: Tz) -> Result<DateTime<Utc>, ReminderError> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| ReminderError::InvalidDueTime {
            date,
            time,
            timezone: tz.name().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap()
    }

    #[rstest]
    #[case(Duration::hours(48), true, true)]
    #[case(Duration::hours(24) + Duration::minutes(1), true, true)]
    #[case(Duration::hours(24), false, true)]
    #[case(Duration::hours(3), false, true)]
    #[case(Duration::minutes(61), false, true)]
    #[case(Duration::hours(1), false, false)]
    #[case(Duration::minutes(30), false, false)]
    fn test_plan_for_due(#[case] lead: Duration, #[case] day: bool, #[case] hour: bool) {
        let plan = ReminderPlan::for_due(now(), now() + lead);
        assert_eq!(plan.twenty_four_hour, day);
        assert_eq!(plan.one_hour, hour);
    }

    #[rstest]
    #[case(Duration::hours(26), None)]
    #[case(Duration::hours(25), Some(ReminderKind::TwentyFourHour))]
    #[case(Duration::hours(24), Some(ReminderKind::TwentyFourHour))]
    #[case(Duration::hours(23), Some(ReminderKind::TwentyFourHour))]
    #[case(Duration::hours(22), None)]
    #[case(Duration::minutes(65), Some(ReminderKind::OneHour))]
    #[case(Duration::minutes(60), Some(ReminderKind::OneHour))]
    #[case(Duration::minutes(55), Some(ReminderKind::OneHour))]
    #[case(Duration::minutes(54), None)]
    fn test_scan_windows(#[case] until_due: Duration, #[case] expected: Option<ReminderKind>) {
        assert_eq!(ReminderKind::in_window(until_due), expected);
    }

    #[test]
    fn test_each_reminder_fires_once() {
        let due = now() + Duration::hours(48);
        let mut state = NotificationState::scheduled(now(), due, true);

        let day_before = due - Duration::hours(24);
        assert_eq!(state.pending(day_before), Some(ReminderKind::TwentyFourHour));
        state.mark_sent(ReminderKind::TwentyFourHour);
        assert_eq!(state.pending(day_before), None);

        let hour_before = due - Duration::hours(1);
        assert_eq!(state.pending(hour_before), Some(ReminderKind::OneHour));
        state.mark_sent(ReminderKind::OneHour);
        assert_eq!(state.pending(hour_before), None);
    }

    #[test]
    fn test_unplanned_reminder_never_fires() {
        // Scheduled 23.5 hours out: inside the 24-hour window, but not planned.
        let due = now() + Duration::hours(23) + Duration::minutes(30);
        let state = NotificationState::scheduled(now(), due, true);

        assert_eq!(state.pending(now()), None);
        assert_eq!(
            state.pending(due - Duration::hours(1)),
            Some(ReminderKind::OneHour)
        );
    }

    #[test]
    fn test_disabled_or_past_due_never_fires() {
        let due = now() + Duration::hours(48);
        let disabled = NotificationState::scheduled(now(), due, false);
        assert_eq!(disabled.pending(due - Duration::hours(24)), None);

        let enabled = NotificationState::scheduled(now(), due, true);
        assert_eq!(enabled.pending(due + Duration::minutes(5)), None);
    }

    #[test]
    fn test_resolve_due_at_in_timezone() {
        let date = NaiveDate::from_ymd_opt(2026, 5, 10).unwrap();
        let time = NaiveTime::from_hms_opt(18, 30, 0).unwrap();

        let due = resolve_due_at(date, time, chrono_tz::Asia::Kolkata).unwrap();
        assert_eq!(due, Utc.with_ymd_and_hms(2026, 5, 10, 13, 0, 0).unwrap());
    }

    #[test]
    fn test_resolve_due_at_rejects_skipped_local_time() {
        // 02:30 does not exist on the spring-forward day in New York.
        let date = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let time = NaiveTime::from_hms_opt(2, 30, 0).unwrap();

        let err = resolve_due_at(date, time, chrono_tz::America::New_York).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DUE_TIME");
    }
}
