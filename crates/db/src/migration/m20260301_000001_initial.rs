//! Initial database migration.
//!
//! Creates the user directory, expenses and participant shares.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TABLES
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(EXPENSES_SQL).await?;
        db.execute_unprepared(PARTICIPANT_SHARES_SQL).await?;

        // ============================================================
        // PART 3: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE expense_type AS ENUM ('personal', 'group');

CREATE TYPE split_rule AS ENUM ('equal', 'exact', 'percentage');
";

const USERS_SQL: &str = r"
-- Read-mostly mirror of the identity service's user directory
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    username VARCHAR(150) NOT NULL UNIQUE,
    email VARCHAR(255) NOT NULL UNIQUE,
    full_name VARCHAR(255) NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const EXPENSES_SQL: &str = r"
CREATE TABLE expenses (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    expense_date DATE NOT NULL,
    amount NUMERIC(12, 2) NOT NULL,
    note TEXT,
    expense_type expense_type NOT NULL,
    split_rule split_rule,
    friend_count INTEGER,
    include_self BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_expense_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_friend_count_non_negative CHECK (friend_count IS NULL OR friend_count >= 0),
    CONSTRAINT chk_split_fields_match_type CHECK (
        (expense_type = 'personal' AND split_rule IS NULL AND friend_count IS NULL)
        OR (expense_type = 'group' AND split_rule IS NOT NULL AND friend_count IS NOT NULL)
    )
);

CREATE INDEX idx_expenses_owner_date ON expenses(owner_id, expense_date DESC, created_at DESC);
";

const PARTICIPANT_SHARES_SQL: &str = r"
-- Derived rows: regenerated wholesale whenever a split-relevant field changes
CREATE TABLE participant_shares (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    expense_id UUID NOT NULL REFERENCES expenses(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    name VARCHAR(255) NOT NULL,
    username VARCHAR(150),
    email VARCHAR(255),
    declared_value NUMERIC(19, 4),
    amount NUMERIC(12, 2) NOT NULL,
    note TEXT,
    is_paid BOOLEAN NOT NULL DEFAULT false,
    is_owner_share BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_share_identity CHECK (username IS NOT NULL OR email IS NOT NULL),
    CONSTRAINT chk_owner_share_paid CHECK (NOT is_owner_share OR is_paid),
    CONSTRAINT uq_share_position UNIQUE (expense_id, position),
    CONSTRAINT uq_share_username UNIQUE (expense_id, username),
    CONSTRAINT uq_share_email UNIQUE (expense_id, email)
);

CREATE INDEX idx_participant_shares_unpaid ON participant_shares(expense_id) WHERE NOT is_paid;
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_users_updated_at
BEFORE UPDATE ON users
FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_expenses_updated_at
BEFORE UPDATE ON expenses
FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_participant_shares_updated_at
BEFORE UPDATE ON participant_shares
FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS participant_shares CASCADE;
DROP TABLE IF EXISTS expenses CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP FUNCTION IF EXISTS set_updated_at() CASCADE;
DROP TYPE IF EXISTS split_rule;
DROP TYPE IF EXISTS expense_type;
";
