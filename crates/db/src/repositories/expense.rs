//! Expense ledger repository.
//!
//! Owns expenses and their participant shares. Every write validates through
//! `SplitService` before touching the database, and a regenerated share set
//! replaces the old one inside a single database transaction.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use splitledger_core::settlement::{ExpenseRecord, ShareRecord};
use splitledger_core::split::{
    ExpenseHeader, ExpenseType, HeaderPatch, ParticipantInput, ShareDraft, ShareSnapshot,
    SplitError, SplitErrorCategory, SplitService, SplitValidator,
};
use splitledger_shared::AppError;
use splitledger_shared::types::{ExpenseId, PageRequest, PageResponse, ParticipantId, round_money};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::user::registered_usernames;
use crate::entities::{expense_notifications, expenses, participant_shares, users};

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The request failed split validation.
    #[error(transparent)]
    Split(#[from] SplitError),

    /// Expense not found, or not owned by the caller.
    #[error("Expense not found: {0}")]
    ExpenseNotFound(Uuid),

    /// Share row not found on the expense.
    #[error("Participant not found: {0}")]
    ParticipantNotFound(Uuid),

    /// The owner is missing from the user directory.
    #[error("Owner not found: {0}")]
    OwnerNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Split(err) => err.error_code(),
            Self::ExpenseNotFound(_) => "EXPENSE_NOT_FOUND",
            Self::ParticipantNotFound(_) => "PARTICIPANT_NOT_FOUND",
            Self::OwnerNotFound(_) => "OWNER_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Split(split) => match split.category() {
                SplitErrorCategory::Validation => Self::Validation(split.to_string()),
                SplitErrorCategory::Conflict => Self::Conflict(split.to_string()),
            },
            LedgerError::ExpenseNotFound(_)
            | LedgerError::ParticipantNotFound(_)
            | LedgerError::OwnerNotFound(_) => Self::NotFound(err.to_string()),
            LedgerError::Database(db) => Self::Transient(db.to_string()),
        }
    }
}

/// Input for creating an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseInput {
    /// Expense header.
    pub header: ExpenseHeader,
    /// External participant declarations, in display order.
    pub participants: Vec<ParticipantInput>,
}

/// Input for updating an expense.
#[derive(Debug, Clone, Default)]
pub struct UpdateExpenseInput {
    /// Header fields to change.
    pub patch: HeaderPatch,
    /// Replacement participant declarations, if any.
    pub participants: Option<Vec<ParticipantInput>>,
}

/// Input for correcting one share row in place.
///
/// `username`, `email` and `note` are cleared by an empty string.
#[derive(Debug, Clone, Default)]
pub struct UpdateParticipantInput {
    /// New display name.
    pub name: Option<String>,
    /// New username.
    pub username: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New note.
    pub note: Option<String>,
    /// New paid flag.
    pub is_paid: Option<bool>,
}

/// Expense with its share rows in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseWithShares {
    /// Expense header row.
    pub expense: expenses::Model,
    /// Share rows, ordered by position.
    pub shares: Vec<participant_shares::Model>,
}

impl ExpenseWithShares {
    /// Returns the stored header in domain form.
    #[must_use]
    pub fn header(&self) -> ExpenseHeader {
        let e = &self.expense;
        ExpenseHeader {
            name: e.name.clone(),
            date: e.expense_date,
            amount: e.amount,
            note: e.note.clone(),
            expense_type: e.expense_type.into(),
            split_rule: e.split_rule.map(Into::into),
            friend_count: e.friend_count.and_then(|c| u32::try_from(c).ok()),
            include_self: e.include_self,
        }
    }

    /// Returns the stored external declarations, so a header-only change can
    /// be replayed against them.
    #[must_use]
    pub fn declarations(&self) -> Vec<ParticipantInput> {
        self.shares
            .iter()
            .filter(|s| !s.is_owner_share)
            .map(|s| ParticipantInput {
                name: s.name.clone(),
                username: s.username.clone(),
                email: s.email.clone(),
                value: s.declared_value,
                note: s.note.clone(),
            })
            .collect()
    }

    /// Converts to the settlement aggregator's read model.
    #[must_use]
    pub fn to_record(&self) -> ExpenseRecord {
        let e = &self.expense;
        ExpenseRecord {
            id: ExpenseId::from_uuid(e.id),
            date: e.expense_date,
            name: e.name.clone(),
            amount: e.amount,
            note: e.note.clone(),
            expense_type: e.expense_type.into(),
            shares: self.shares.iter().map(share_record).collect(),
        }
    }
}

fn share_record(share: &participant_shares::Model) -> ShareRecord {
    ShareRecord {
        id: ParticipantId::from_uuid(share.id),
        name: share.name.clone(),
        username: share.username.clone(),
        email: share.email.clone(),
        amount: share.amount,
        note: share.note.clone(),
        is_paid: share.is_paid,
        is_owner_share: share.is_owner_share,
    }
}

fn snapshot(share: &participant_shares::Model) -> ShareSnapshot {
    ShareSnapshot {
        id: ParticipantId::from_uuid(share.id),
        username: share.username.clone(),
        email: share.email.clone(),
        amount: share.amount,
        is_owner_share: share.is_owner_share,
    }
}

/// Trims an optional text edit; an empty value clears the field.
fn cleared(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn to_db_count(count: Option<u32>) -> Option<i32> {
    count.map(|c| i32::try_from(c).unwrap_or(i32::MAX))
}

/// Expense ledger repository.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an expense and, for group expenses, its full share set.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The owner is not in the user directory
    /// - The header or participants fail split validation
    /// - Database operation fails
    pub async fn create_expense(
        &self,
        owner_id: Uuid,
        input: CreateExpenseInput,
    ) -> Result<ExpenseWithShares, LedgerError> {
        let owner = self.find_owner(owner_id).await?;
        let header = input.header.normalized();

        let drafts = Self::plan(&self.db, &header, &input.participants, &owner)
            .await
            .inspect_err(|err| {
                warn!(owner_id = %owner_id, code = err.error_code(), error = %err, "Expense rejected");
            })?;

        let txn = self.db.begin().await?;

        let now = Utc::now().into();
        let expense = expenses::ActiveModel {
            id: Set(Uuid::now_v7()),
            owner_id: Set(owner_id),
            name: Set(header.name.clone()),
            expense_date: Set(header.date),
            amount: Set(header.amount),
            note: Set(header.note.clone()),
            expense_type: Set(header.expense_type.into()),
            split_rule: Set(header.split_rule.map(Into::into)),
            friend_count: Set(to_db_count(header.friend_count)),
            include_self: Set(header.include_self),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let shares = Self::insert_shares(&txn, expense.id, &drafts).await?;

        txn.commit().await?;

        info!(
            owner_id = %owner_id,
            expense_id = %expense.id,
            expense_type = header.expense_type.as_str(),
            shares = shares.len(),
            "Expense created"
        );

        Ok(ExpenseWithShares { expense, shares })
    }

    /// Updates an expense header and regenerates its shares when a
    /// split-relevant value actually changed.
    ///
    /// Without replacement participants, regeneration replays the stored
    /// declarations against the merged header. Regenerated shares start
    /// unpaid again, except the owner's.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The expense does not exist or is not owned by the caller
    /// - The merged header or participants fail split validation
    /// - Database operation fails
    pub async fn update_expense(
        &self,
        owner_id: Uuid,
        expense_id: Uuid,
        input: UpdateExpenseInput,
    ) -> Result<ExpenseWithShares, LedgerError> {
        let current = self.get_expense(owner_id, expense_id).await?;
        let current_header = current.header();
        let merged = input.patch.merge(&current_header);
        let stored = current.declarations();

        let regenerate = SplitService::needs_regeneration(
            &current_header,
            &stored,
            &merged,
            input.participants.as_deref(),
        );

        if !regenerate {
            let incoming = input.participants.as_ref().map_or(0, Vec::len);
            SplitValidator::validate_header(&merged, incoming).inspect_err(|err| {
                warn!(expense_id = %expense_id, code = err.error_code(), error = %err, "Expense update rejected");
            })?;

            debug!(expense_id = %expense_id, "No split-relevant change, shares kept");

            if merged == current_header {
                return Ok(current);
            }

            let mut active: expenses::ActiveModel = current.expense.clone().into();
            apply_header(&mut active, &merged);
            let expense = active.update(&self.db).await?;

            info!(owner_id = %owner_id, expense_id = %expense_id, "Expense updated");
            return Ok(ExpenseWithShares {
                expense,
                shares: current.shares,
            });
        }

        let owner = self.find_owner(owner_id).await?;
        let participants = SplitService::participants_for_update(&merged, stored, input.participants);

        let drafts = Self::plan(&self.db, &merged, &participants, &owner)
            .await
            .inspect_err(|err| {
                warn!(expense_id = %expense_id, code = err.error_code(), error = %err, "Expense update rejected");
            })?;

        let txn = self.db.begin().await?;

        let mut active: expenses::ActiveModel = current.expense.clone().into();
        apply_header(&mut active, &merged);
        let expense = active.update(&txn).await?;

        participant_shares::Entity::delete_many()
            .filter(participant_shares::Column::ExpenseId.eq(expense_id))
            .exec(&txn)
            .await?;

        if merged.expense_type == ExpenseType::Personal {
            expense_notifications::Entity::delete_many()
                .filter(expense_notifications::Column::ExpenseId.eq(expense_id))
                .exec(&txn)
                .await?;
        }

        let shares = Self::insert_shares(&txn, expense_id, &drafts).await?;

        txn.commit().await?;

        info!(
            owner_id = %owner_id,
            expense_id = %expense_id,
            shares = shares.len(),
            "Expense updated, shares regenerated"
        );

        Ok(ExpenseWithShares { expense, shares })
    }

    /// Gets an expense with its shares.
    ///
    /// # Errors
    ///
    /// Returns an error if the expense is not found or database query fails.
    pub async fn get_expense(
        &self,
        owner_id: Uuid,
        expense_id: Uuid,
    ) -> Result<ExpenseWithShares, LedgerError> {
        let expense = expenses::Entity::find_by_id(expense_id)
            .filter(expenses::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?
            .ok_or(LedgerError::ExpenseNotFound(expense_id))?;

        let shares = participant_shares::Entity::find()
            .filter(participant_shares::Column::ExpenseId.eq(expense_id))
            .order_by_asc(participant_shares::Column::Position)
            .all(&self.db)
            .await?;

        Ok(ExpenseWithShares { expense, shares })
    }

    /// Lists the owner's expenses, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_expenses(
        &self,
        owner_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResponse<ExpenseWithShares>, LedgerError> {
        let page = page.normalized();

        let owned = expenses::Entity::find().filter(expenses::Column::OwnerId.eq(owner_id));

        let total = owned.clone().count(&self.db).await?;
        let rows = owned
            .order_by_desc(expenses::Column::ExpenseDate)
            .order_by_desc(expenses::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;
        let data = attach_shares(&self.db, rows).await?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Deletes an expense. Shares and the reminder schedule go with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the expense is not found or database operation fails.
    pub async fn delete_expense(&self, owner_id: Uuid, expense_id: Uuid) -> Result<(), LedgerError> {
        let result = expenses::Entity::delete_many()
            .filter(expenses::Column::Id.eq(expense_id))
            .filter(expenses::Column::OwnerId.eq(owner_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(LedgerError::ExpenseNotFound(expense_id));
        }

        info!(owner_id = %owner_id, expense_id = %expense_id, "Expense deleted");
        Ok(())
    }

    /// Sets one share's paid flag. No other row changes.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The expense or share is not found
    /// - The share is the owner's and `paid` is false
    /// - Database operation fails
    pub async fn set_participant_paid(
        &self,
        owner_id: Uuid,
        expense_id: Uuid,
        participant_id: Uuid,
        paid: bool,
    ) -> Result<participant_shares::Model, LedgerError> {
        let share = self.find_share(owner_id, expense_id, participant_id).await?;
        SplitValidator::validate_paid_toggle(share.is_owner_share, paid)?;

        if share.is_paid == paid {
            return Ok(share);
        }

        let mut active: participant_shares::ActiveModel = share.into();
        active.is_paid = Set(paid);
        let share = active.update(&self.db).await?;

        info!(
            expense_id = %expense_id,
            participant_id = %participant_id,
            paid,
            "Payment status updated"
        );

        Ok(share)
    }

    /// Corrects one share row in place, re-checking identity uniqueness and
    /// the share total against the sibling rows.
    ///
    /// An edited amount also rewrites the stored declaration so that a later
    /// regeneration reproduces it. When the owner takes part, the owner's row
    /// absorbs the difference in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The expense or share is not found
    /// - The edit breaks identity rules or the share total
    /// - Database operation fails
    pub async fn update_participant(
        &self,
        owner_id: Uuid,
        expense_id: Uuid,
        participant_id: Uuid,
        input: UpdateParticipantInput,
    ) -> Result<participant_shares::Model, LedgerError> {
        let current = self.get_expense(owner_id, expense_id).await?;
        let Some(rule) = current.expense.split_rule.map(Into::into) else {
            return Err(LedgerError::ParticipantNotFound(participant_id));
        };

        let (edited_rows, siblings): (Vec<_>, Vec<_>) = current
            .shares
            .iter()
            .partition(|s| s.id == participant_id);
        let share = edited_rows
            .into_iter()
            .next()
            .cloned()
            .ok_or(LedgerError::ParticipantNotFound(participant_id))?;

        let username = input.username.as_deref().map_or_else(|| share.username.clone(), cleared);
        let email = input.email.as_deref().map_or_else(|| share.email.clone(), cleared);
        let amount = input.amount.map_or(share.amount, round_money);

        if !share.is_owner_share && amount < Decimal::ZERO {
            return Err(SplitError::NegativeAmount {
                index: usize::try_from(share.position).unwrap_or_default(),
                value: amount,
            }
            .into());
        }
        if let Some(paid) = input.is_paid {
            SplitValidator::validate_paid_toggle(share.is_owner_share, paid)?;
        }

        let edited = ShareSnapshot {
            username: username.clone(),
            email: email.clone(),
            amount,
            ..snapshot(&share)
        };
        let siblings: Vec<ShareSnapshot> = siblings.into_iter().map(snapshot).collect();
        let registered =
            registered_usernames(&self.db, edited.username.as_deref().into_iter()).await?;

        let owner_amount = SplitValidator::validate_share_edit(
            current.expense.amount,
            rule,
            current.expense.include_self,
            &siblings,
            &edited,
            |u| registered.contains(u),
        )
        .inspect_err(|err| {
            warn!(
                expense_id = %expense_id,
                participant_id = %participant_id,
                code = err.error_code(),
                error = %err,
                "Participant edit rejected"
            );
        })?;

        let amount_changed = amount != share.amount;
        let is_owner_share = share.is_owner_share;
        let mut active: participant_shares::ActiveModel = share.into();
        if let Some(name) = input.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            active.name = Set(name.to_string());
        }
        active.username = Set(username);
        active.email = Set(email);
        if let Some(note) = input.note.as_deref() {
            active.note = Set(cleared(note));
        }
        if let Some(paid) = input.is_paid {
            active.is_paid = Set(paid);
        }
        if amount_changed {
            active.amount = Set(amount);
            if !is_owner_share {
                active.declared_value = Set(SplitService::declared_value_for(
                    rule,
                    amount,
                    current.expense.amount,
                ));
            }
        }
        let owner_row = current
            .shares
            .iter()
            .find(|s| s.is_owner_share)
            .filter(|row| owner_amount.is_some_and(|amount| amount != row.amount))
            .cloned();

        let txn = self.db.begin().await?;
        let share = active.update(&txn).await?;

        if let (Some(row), Some(amount)) = (owner_row, owner_amount) {
            let mut owner_active: participant_shares::ActiveModel = row.into();
            owner_active.amount = Set(amount);
            owner_active.update(&txn).await?;
            debug!(expense_id = %expense_id, owner_amount = %amount, "Owner share rebalanced");
        }

        txn.commit().await?;

        info!(expense_id = %expense_id, participant_id = %participant_id, "Participant updated");
        Ok(share)
    }

    /// Removes one share row.
    ///
    /// # Errors
    ///
    /// Returns an error if the expense or share is not found or database
    /// operation fails.
    pub async fn delete_participant(
        &self,
        owner_id: Uuid,
        expense_id: Uuid,
        participant_id: Uuid,
    ) -> Result<(), LedgerError> {
        let share = self.find_share(owner_id, expense_id, participant_id).await?;
        participant_shares::Entity::delete_by_id(share.id)
            .exec(&self.db)
            .await?;

        info!(expense_id = %expense_id, participant_id = %participant_id, "Participant removed");
        Ok(())
    }

    async fn find_owner(&self, owner_id: Uuid) -> Result<users::Model, LedgerError> {
        users::Entity::find_by_id(owner_id)
            .one(&self.db)
            .await?
            .ok_or(LedgerError::OwnerNotFound(owner_id))
    }

    async fn find_share(
        &self,
        owner_id: Uuid,
        expense_id: Uuid,
        participant_id: Uuid,
    ) -> Result<participant_shares::Model, LedgerError> {
        let owned = expenses::Entity::find_by_id(expense_id)
            .filter(expenses::Column::OwnerId.eq(owner_id))
            .count(&self.db)
            .await?;
        if owned == 0 {
            return Err(LedgerError::ExpenseNotFound(expense_id));
        }

        participant_shares::Entity::find_by_id(participant_id)
            .filter(participant_shares::Column::ExpenseId.eq(expense_id))
            .one(&self.db)
            .await?
            .ok_or(LedgerError::ParticipantNotFound(participant_id))
    }

    /// Runs split planning with a directory lookup for the declared usernames.
    async fn plan<C: ConnectionTrait>(
        db: &C,
        header: &ExpenseHeader,
        participants: &[ParticipantInput],
        owner: &users::Model,
    ) -> Result<Vec<ShareDraft>, LedgerError> {
        let registered =
            registered_usernames(db, participants.iter().filter_map(ParticipantInput::username_key))
                .await?;

        let drafts = SplitService::plan(header, participants, &owner.owner_identity(), |u| {
            registered.contains(u)
        })?;
        Ok(drafts)
    }

    async fn insert_shares(
        txn: &DatabaseTransaction,
        expense_id: Uuid,
        drafts: &[ShareDraft],
    ) -> Result<Vec<participant_shares::Model>, DbErr> {
        let now = Utc::now().into();
        let mut shares = Vec::with_capacity(drafts.len());

        for (position, draft) in drafts.iter().enumerate() {
            let share = participant_shares::ActiveModel {
                id: Set(Uuid::now_v7()),
                expense_id: Set(expense_id),
                position: Set(i32::try_from(position).unwrap_or(i32::MAX)),
                name: Set(draft.name.clone()),
                username: Set(draft.username.clone()),
                email: Set(draft.email.clone()),
                declared_value: Set(draft.declared_value),
                amount: Set(draft.amount),
                note: Set(draft.note.clone()),
                is_paid: Set(draft.is_paid),
                is_owner_share: Set(draft.is_owner_share),
                created_at: Set(now),
                updated_at: Set(now),
            };
            shares.push(share.insert(txn).await?);
        }

        Ok(shares)
    }
}

fn apply_header(active: &mut expenses::ActiveModel, header: &ExpenseHeader) {
    active.name = Set(header.name.clone());
    active.expense_date = Set(header.date);
    active.amount = Set(header.amount);
    active.note = Set(header.note.clone());
    active.expense_type = Set(header.expense_type.into());
    active.split_rule = Set(header.split_rule.map(Into::into));
    active.friend_count = Set(to_db_count(header.friend_count));
    active.include_self = Set(header.include_self);
}

/// Loads share rows for a page of expenses, keeping the expense order.
async fn attach_shares<C: ConnectionTrait>(
    db: &C,
    rows: Vec<expenses::Model>,
) -> Result<Vec<ExpenseWithShares>, DbErr> {
    if rows.is_empty() {
        return Ok(vec![]);
    }

    let ids: Vec<Uuid> = rows.iter().map(|e| e.id).collect();
    let mut by_expense: HashMap<Uuid, Vec<participant_shares::Model>> = HashMap::new();
    for share in participant_shares::Entity::find()
        .filter(participant_shares::Column::ExpenseId.is_in(ids))
        .order_by_asc(participant_shares::Column::ExpenseId)
        .order_by_asc(participant_shares::Column::Position)
        .all(db)
        .await?
    {
        by_expense.entry(share.expense_id).or_default().push(share);
    }

    Ok(rows
        .into_iter()
        .map(|expense| {
            let shares = by_expense.remove(&expense.id).unwrap_or_default();
            ExpenseWithShares { expense, shares }
        })
        .collect())
}

/// Loads every expense of an owner with its shares.
pub(crate) async fn load_owner_expenses<C: ConnectionTrait>(
    db: &C,
    owner_id: Uuid,
) -> Result<Vec<ExpenseWithShares>, DbErr> {
    let rows = expenses::Entity::find()
        .filter(expenses::Column::OwnerId.eq(owner_id))
        .order_by_desc(expenses::Column::ExpenseDate)
        .order_by_desc(expenses::Column::CreatedAt)
        .all(db)
        .await?;

    attach_shares(db, rows).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::sea_orm_active_enums;
    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use splitledger_core::split::SplitRule;

    fn expense() -> expenses::Model {
        let now = Utc::now().into();
        expenses::Model {
            id: Uuid::now_v7(),
            owner_id: Uuid::now_v7(),
            name: "Dinner".to_string(),
            expense_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            amount: dec!(100.00),
            note: None,
            expense_type: sea_orm_active_enums::ExpenseType::Group,
            split_rule: Some(sea_orm_active_enums::SplitRule::Exact),
            friend_count: Some(2),
            include_self: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn share(
        expense_id: Uuid,
        position: i32,
        name: &str,
        declared: Option<Decimal>,
        amount: Decimal,
        owner: bool,
    ) -> participant_shares::Model {
        let now = Utc::now().into();
        participant_shares::Model {
            id: Uuid::now_v7(),
            expense_id,
            position,
            name: name.to_string(),
            username: Some(name.to_lowercase()),
            email: None,
            declared_value: declared,
            amount,
            note: None,
            is_paid: owner,
            is_owner_share: owner,
            created_at: now,
            updated_at: now,
        }
    }

    fn fixture() -> ExpenseWithShares {
        let expense = expense();
        let id = expense.id;
        ExpenseWithShares {
            expense,
            shares: vec![
                share(id, 0, "Asha", Some(dec!(40.0000)), dec!(40.00), false),
                share(id, 1, "Kiran", Some(dec!(35.0000)), dec!(35.00), false),
                share(id, 2, "Ravi", None, dec!(25.00), true),
            ],
        }
    }

    #[test]
    fn test_header_round_trips_stored_columns() {
        let header = fixture().header();
        assert_eq!(header.expense_type, ExpenseType::Group);
        assert_eq!(header.split_rule, Some(SplitRule::Exact));
        assert_eq!(header.friend_count, Some(2));
        assert!(header.include_self);
    }

    #[test]
    fn test_declarations_skip_owner_row() {
        let declarations = fixture().declarations();
        let names: Vec<_> = declarations.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Asha", "Kiran"]);
        assert_eq!(declarations[0].value, Some(dec!(40)));
    }

    #[test]
    fn test_unchanged_resubmission_keeps_shares() {
        let stored = fixture();
        let header = stored.header();
        let incoming = vec![
            ParticipantInput {
                name: " Asha ".to_string(),
                username: Some("asha".to_string()),
                value: Some(dec!(40)),
                ..ParticipantInput::default()
            },
            ParticipantInput {
                name: "Kiran".to_string(),
                username: Some("kiran".to_string()),
                value: Some(dec!(35.00)),
                ..ParticipantInput::default()
            },
        ];

        assert!(!SplitService::needs_regeneration(
            &header,
            &stored.declarations(),
            &header,
            Some(&incoming),
        ));
    }

    #[test]
    fn test_to_record_keeps_share_order() {
        let record = fixture().to_record();
        assert_eq!(record.shares.len(), 3);
        assert!(record.shares[2].is_owner_share);
        assert_eq!(record.amount, dec!(100));
    }

    #[rstest]
    #[case::validation(LedgerError::Split(SplitError::MissingSplitRule), 400, false)]
    #[case::conflict(LedgerError::Split(SplitError::OwnerShareAlwaysPaid), 409, false)]
    #[case::overflow(
        LedgerError::Split(SplitError::ShareOverflow { external: dec!(110), total: dec!(100) }),
        409,
        false
    )]
    #[case::expense_missing(LedgerError::ExpenseNotFound(Uuid::nil()), 404, false)]
    #[case::share_missing(LedgerError::ParticipantNotFound(Uuid::nil()), 404, false)]
    #[case::storage(LedgerError::Database(DbErr::Custom("down".to_string())), 503, true)]
    fn test_ledger_errors_map_to_taxonomy(
        #[case] err: LedgerError,
        #[case] status: u16,
        #[case] retryable: bool,
    ) {
        let app: AppError = err.into();
        assert_eq!(app.status_code(), status);
        assert_eq!(app.is_retryable(), retryable);
    }

    #[rstest]
    #[case("  ", None)]
    #[case("", None)]
    #[case(" asha ", Some("asha"))]
    #[case("kiran@example.com", Some("kiran@example.com"))]
    fn test_cleared_text(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(cleared(input).as_deref(), expected);
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(3), Some(3))]
    #[case(Some(u32::MAX), Some(i32::MAX))]
    fn test_friend_count_column(#[case] count: Option<u32>, #[case] expected: Option<i32>) {
        assert_eq!(to_db_count(count), expected);
    }
}
