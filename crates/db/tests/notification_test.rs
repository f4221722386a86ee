//! Integration tests for reminder schedules.

mod common;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use splitledger_core::reminder::ReminderKind;
use splitledger_core::split::SplitRule;
use splitledger_db::repositories::{CreateExpenseInput, ScheduleReminderInput};
use splitledger_db::{ExpenseRepository, NotificationRepository};

#[tokio::test]
async fn test_schedule_scan_and_claim() {
    let Some(db) = common::setup().await else {
        return;
    };
    let owner = common::create_user(&db, "Ravi").await;
    let friend = common::create_user(&db, "Vikram").await;
    let ledger = ExpenseRepository::new(db.clone());
    let notifications = NotificationRepository::new(db.clone());

    let expense = ledger
        .create_expense(
            owner.id,
            CreateExpenseInput {
                header: common::group_header(dec!(80), SplitRule::Equal, 2, false),
                participants: vec![
                    common::by_email("Asha", None),
                    common::by_username(&friend, None),
                ],
            },
        )
        .await
        .expect("Failed to create expense");

    let now = Utc::now();
    let due_local = (now + Duration::hours(48)).naive_utc();
    let scheduled = notifications
        .schedule(
            owner.id,
            expense.expense.id,
            ScheduleReminderInput {
                due_date: due_local.date(),
                due_time: due_local.time(),
                enabled: true,
            },
            chrono_tz::UTC,
            now,
        )
        .await
        .expect("Failed to schedule");
    assert!(!scheduled.reminder_24h_sent);
    assert!(!scheduled.reminder_1h_sent);

    let scan_at = now + Duration::hours(24);
    let due = notifications.find_due(scan_at).await.expect("Failed to scan");
    let row = due
        .iter()
        .find(|n| n.expense_id == expense.expense.id)
        .expect("schedule is due for the day-before reminder");
    assert_eq!(row.state().pending(scan_at), Some(ReminderKind::TwentyFourHour));

    assert!(notifications
        .mark_sent(row.id, ReminderKind::TwentyFourHour)
        .await
        .expect("Failed to claim"));
    assert!(!notifications
        .mark_sent(row.id, ReminderKind::TwentyFourHour)
        .await
        .expect("Failed to claim"));

    let batch = notifications
        .reminder_batch(expense.expense.id)
        .await
        .expect("Failed to load batch")
        .expect("expense exists");
    assert_eq!(batch.unpaid.len(), 2);
    assert_eq!(batch.directory.get(&friend.username), Some(&friend.email));
}

#[tokio::test]
async fn test_personal_expense_rejects_reminders() {
    let Some(db) = common::setup().await else {
        return;
    };
    let owner = common::create_user(&db, "Ravi").await;
    let ledger = ExpenseRepository::new(db.clone());
    let notifications = NotificationRepository::new(db.clone());

    let expense = ledger
        .create_expense(
            owner.id,
            CreateExpenseInput {
                header: common::personal_header(dec!(20)),
                participants: vec![],
            },
        )
        .await
        .expect("Failed to create expense");

    let due = (Utc::now() + Duration::hours(3)).naive_utc();
    let err = notifications
        .schedule(
            owner.id,
            expense.expense.id,
            ScheduleReminderInput {
                due_date: due.date(),
                due_time: due.time(),
                enabled: true,
            },
            chrono_tz::UTC,
            Utc::now(),
        )
        .await
        .expect_err("personal expenses have no reminders");
    assert_eq!(err.error_code(), "NOT_GROUP_EXPENSE");
}
