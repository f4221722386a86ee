//! `SeaORM` Entity for users table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use splitledger_core::split::OwnerIdentity;
use splitledger_shared::types::UserId;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub full_name: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Model {
    /// Name used on the owner's share row and in reminder signatures.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }

    /// Identity threaded through split planning when this user owns an
    /// expense.
    #[must_use]
    pub fn owner_identity(&self) -> OwnerIdentity {
        OwnerIdentity {
            user_id: UserId::from_uuid(self.id),
            username: self.username.clone(),
            display_name: self.display_name().to_string(),
            email: Some(self.email.clone()),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
