//! Expense notifications migration.
//!
//! Creates the reminder schedule table, one row per group expense.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(EXPENSE_NOTIFICATIONS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS expense_notifications CASCADE;")
            .await?;
        Ok(())
    }
}

const EXPENSE_NOTIFICATIONS_SQL: &str = r"
CREATE TABLE expense_notifications (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    expense_id UUID NOT NULL UNIQUE REFERENCES expenses(id) ON DELETE CASCADE,
    due_date DATE NOT NULL,
    due_time TIME NOT NULL,
    due_at TIMESTAMPTZ NOT NULL,
    enabled BOOLEAN NOT NULL DEFAULT false,
    -- Set when the reminder went out, or when it was left out of the plan
    reminder_24h_sent BOOLEAN NOT NULL DEFAULT false,
    reminder_1h_sent BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Index for the periodic reminder scan
CREATE INDEX idx_expense_notifications_pending ON expense_notifications(due_at)
    WHERE enabled AND NOT (reminder_24h_sent AND reminder_1h_sent);

CREATE TRIGGER trg_expense_notifications_updated_at
BEFORE UPDATE ON expense_notifications
FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";
