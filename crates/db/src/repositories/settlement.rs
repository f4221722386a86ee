//! Settlement repository: read-only rollups over committed ledger state.

use sea_orm::{DatabaseConnection, DbErr, EntityTrait};
use splitledger_core::settlement::{
    BalanceSheet, ExpenseRecord, PortfolioSummary, SettlementService, UnpaidShare,
};
use splitledger_shared::AppError;
use uuid::Uuid;

use super::expense::load_owner_expenses;
use crate::entities::users;

/// Error types for settlement queries.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    /// The owner is missing from the user directory.
    #[error("Owner not found: {0}")]
    OwnerNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<SettlementError> for AppError {
    fn from(err: SettlementError) -> Self {
        match err {
            SettlementError::OwnerNotFound(_) => Self::NotFound(err.to_string()),
            SettlementError::Database(db) => Self::Transient(db.to_string()),
        }
    }
}

/// Settlement repository.
#[derive(Debug, Clone)]
pub struct SettlementRepository {
    db: DatabaseConnection,
}

impl SettlementRepository {
    /// Creates a new settlement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Builds the owner's balance sheet.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner is unknown or the database query fails.
    pub async fn balance_sheet(&self, owner_id: Uuid) -> Result<BalanceSheet, SettlementError> {
        let (username, records) = self.load(owner_id).await?;
        Ok(SettlementService::balance_sheet(&username, &records))
    }

    /// Summarizes the owner's personal and group spending.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner is unknown or the database query fails.
    pub async fn portfolio_summary(
        &self,
        owner_id: Uuid,
    ) -> Result<PortfolioSummary, SettlementError> {
        let (username, records) = self.load(owner_id).await?;
        Ok(SettlementService::portfolio_summary(&username, &records))
    }

    /// Lists every unpaid share owed to the owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner is unknown or the database query fails.
    pub async fn list_unpaid(&self, owner_id: Uuid) -> Result<Vec<UnpaidShare>, SettlementError> {
        let (username, records) = self.load(owner_id).await?;
        Ok(SettlementService::unpaid(&username, &records))
    }

    async fn load(&self, owner_id: Uuid) -> Result<(String, Vec<ExpenseRecord>), SettlementError> {
        let owner = users::Entity::find_by_id(owner_id)
            .one(&self.db)
            .await?
            .ok_or(SettlementError::OwnerNotFound(owner_id))?;

        let records = load_owner_expenses(&self.db, owner_id)
            .await?
            .iter()
            .map(super::expense::ExpenseWithShares::to_record)
            .collect();

        Ok((owner.username, records))
    }
}
