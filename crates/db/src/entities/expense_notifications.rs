//! `SeaORM` Entity for expense_notifications table.

use sea_orm::entity::prelude::*;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use splitledger_core::reminder::NotificationState;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expense_notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub expense_id: Uuid,
    pub due_date: Date,
    pub due_time: Time,
    pub due_at: DateTimeWithTimeZone,
    pub enabled: bool,
    pub reminder_24h_sent: bool,
    pub reminder_1h_sent: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_delete = "Cascade"
    )]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Model {
    /// Reminder state as seen by the scan.
    #[must_use]
    pub fn state(&self) -> NotificationState {
        NotificationState {
            due_at: self.due_at.with_timezone(&Utc),
            enabled: self.enabled,
            reminder_24h_sent: self.reminder_24h_sent,
            reminder_1h_sent: self.reminder_1h_sent,
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
