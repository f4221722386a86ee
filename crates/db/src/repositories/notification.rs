//! Expense notification repository.
//!
//! Stores one reminder schedule per group expense and serves the periodic
//! reminder scan. Nothing here touches amounts.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, sea_query::Expr,
};
use splitledger_core::reminder::{NotificationState, ReminderError, ReminderKind, resolve_due_at};
use splitledger_core::settlement::{SettlementService, UnpaidShare};
use splitledger_core::split::ExpenseType;
use splitledger_shared::AppError;
use tracing::info;
use uuid::Uuid;

use super::expense::ExpenseWithShares;
use super::user::emails_by_username;
use crate::entities::{expense_notifications, expenses, participant_shares, users};

/// Error types for notification operations.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// Expense not found, or not owned by the caller.
    #[error("Expense not found: {0}")]
    ExpenseNotFound(Uuid),

    /// Reminder planning failed.
    #[error(transparent)]
    Reminder(#[from] ReminderError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl NotificationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ExpenseNotFound(_) => "EXPENSE_NOT_FOUND",
            Self::Reminder(err) => err.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::ExpenseNotFound(_) => Self::NotFound(err.to_string()),
            NotificationError::Reminder(reminder) => match reminder {
                ReminderError::Delivery(_) => Self::Transient(reminder.to_string()),
                _ => Self::Validation(reminder.to_string()),
            },
            NotificationError::Database(db) => Self::Transient(db.to_string()),
        }
    }
}

/// Input for scheduling reminders.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleReminderInput {
    /// Local due date.
    pub due_date: NaiveDate,
    /// Local due time.
    pub due_time: NaiveTime,
    /// Whether reminders are enabled.
    pub enabled: bool,
}

/// Everything needed to render reminders for one expense.
#[derive(Debug, Clone)]
pub struct ReminderBatch {
    /// The expense with its shares.
    pub expense: ExpenseWithShares,
    /// The expense owner.
    pub owner: users::Model,
    /// Unpaid shares not belonging to the owner.
    pub unpaid: Vec<UnpaidShare>,
    /// Registered emails of the unpaid participants, by username.
    pub directory: HashMap<String, String>,
}

/// Expense notification repository.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    db: DatabaseConnection,
}

impl NotificationRepository {
    /// Creates a new notification repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates or replaces the reminder schedule of a group expense.
    ///
    /// Reminders that no longer fit before the due time are stored as
    /// already sent, so the scan never fires them.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The expense does not exist or is not owned by the caller
    /// - The expense is personal
    /// - The due time does not exist in `tz`
    /// - Database operation fails
    pub async fn schedule(
        &self,
        owner_id: Uuid,
        expense_id: Uuid,
        input: ScheduleReminderInput,
        tz: Tz,
        now: DateTime<Utc>,
    ) -> Result<expense_notifications::Model, NotificationError> {
        let expense = self.find_owned_expense(owner_id, expense_id).await?;
        if ExpenseType::from(expense.expense_type) != ExpenseType::Group {
            return Err(ReminderError::NotGroupExpense.into());
        }

        let due_at = resolve_due_at(input.due_date, input.due_time, tz)?;
        let state = NotificationState::scheduled(now, due_at, input.enabled);
        let stamp = Utc::now().into();

        let existing = expense_notifications::Entity::find()
            .filter(expense_notifications::Column::ExpenseId.eq(expense_id))
            .one(&self.db)
            .await?;

        let model = if let Some(existing) = existing {
            let mut active: expense_notifications::ActiveModel = existing.into();
            active.due_date = Set(input.due_date);
            active.due_time = Set(input.due_time);
            active.due_at = Set(due_at.into());
            active.enabled = Set(state.enabled);
            active.reminder_24h_sent = Set(state.reminder_24h_sent);
            active.reminder_1h_sent = Set(state.reminder_1h_sent);
            active.update(&self.db).await?
        } else {
            expense_notifications::ActiveModel {
                id: Set(Uuid::now_v7()),
                expense_id: Set(expense_id),
                due_date: Set(input.due_date),
                due_time: Set(input.due_time),
                due_at: Set(due_at.into()),
                enabled: Set(state.enabled),
                reminder_24h_sent: Set(state.reminder_24h_sent),
                reminder_1h_sent: Set(state.reminder_1h_sent),
                created_at: Set(stamp),
                updated_at: Set(stamp),
            }
            .insert(&self.db)
            .await?
        };

        info!(
            expense_id = %expense_id,
            due_at = %due_at,
            enabled = input.enabled,
            "Reminders scheduled"
        );

        Ok(model)
    }

    /// Gets the reminder schedule of an expense, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the expense is not found or database query fails.
    pub async fn find_for_expense(
        &self,
        owner_id: Uuid,
        expense_id: Uuid,
    ) -> Result<Option<expense_notifications::Model>, NotificationError> {
        self.find_owned_expense(owner_id, expense_id).await?;

        Ok(expense_notifications::Entity::find()
            .filter(expense_notifications::Column::ExpenseId.eq(expense_id))
            .one(&self.db)
            .await?)
    }

    /// Lists enabled schedules whose due time falls within the widest scan
    /// window from `now` and that still have a reminder outstanding.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_due(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<expense_notifications::Model>, NotificationError> {
        let horizon = ReminderKind::TwentyFourHour
            .window()
            .map_or_else(|| Duration::hours(25), |(_, to)| to);

        Ok(expense_notifications::Entity::find()
            .filter(expense_notifications::Column::Enabled.eq(true))
            .filter(expense_notifications::Column::DueAt.gt(now))
            .filter(expense_notifications::Column::DueAt.lte(now + horizon))
            .filter(
                Condition::any()
                    .add(expense_notifications::Column::Reminder24hSent.eq(false))
                    .add(expense_notifications::Column::Reminder1hSent.eq(false)),
            )
            .order_by_asc(expense_notifications::Column::DueAt)
            .all(&self.db)
            .await?)
    }

    /// Claims a scheduled reminder by flipping its sent flag.
    ///
    /// Returns false when another scan already claimed it, so each reminder
    /// fires at most once.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn mark_sent(
        &self,
        notification_id: Uuid,
        kind: ReminderKind,
    ) -> Result<bool, NotificationError> {
        let column = match kind {
            ReminderKind::TwentyFourHour => expense_notifications::Column::Reminder24hSent,
            ReminderKind::OneHour => expense_notifications::Column::Reminder1hSent,
            ReminderKind::Immediate => return Ok(true),
        };

        let result = expense_notifications::Entity::update_many()
            .col_expr(column, Expr::value(true))
            .filter(expense_notifications::Column::Id.eq(notification_id))
            .filter(column.eq(false))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Loads an expense's unpaid shares plus recipient lookups for rendering.
    ///
    /// Returns `None` when the expense is gone.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn reminder_batch(
        &self,
        expense_id: Uuid,
    ) -> Result<Option<ReminderBatch>, NotificationError> {
        let Some((expense, owner)) = expenses::Entity::find_by_id(expense_id)
            .find_also_related(users::Entity)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        let Some(owner) = owner else {
            return Ok(None);
        };

        let shares = participant_shares::Entity::find()
            .filter(participant_shares::Column::ExpenseId.eq(expense_id))
            .order_by_asc(participant_shares::Column::Position)
            .all(&self.db)
            .await?;
        let expense = ExpenseWithShares { expense, shares };

        let unpaid = SettlementService::unpaid_in(&owner.username, &expense.to_record());
        let directory = emails_by_username(
            &self.db,
            unpaid
                .iter()
                .filter(|u| u.email.is_none())
                .filter_map(|u| u.username.as_deref()),
        )
        .await?;

        Ok(Some(ReminderBatch {
            expense,
            owner,
            unpaid,
            directory,
        }))
    }

    async fn find_owned_expense(
        &self,
        owner_id: Uuid,
        expense_id: Uuid,
    ) -> Result<expenses::Model, NotificationError> {
        expenses::Entity::find_by_id(expense_id)
            .filter(expenses::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?
            .ok_or(NotificationError::ExpenseNotFound(expense_id))
    }
}
