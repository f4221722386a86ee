//! `SeaORM` Entity for expenses table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{ExpenseType, SplitRule};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub expense_date: Date,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub expense_type: ExpenseType,
    pub split_rule: Option<SplitRule>,
    pub friend_count: Option<i32>,
    pub include_self: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(has_many = "super::participant_shares::Entity")]
    ParticipantShares,
    #[sea_orm(has_one = "super::expense_notifications::Entity")]
    ExpenseNotifications,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::participant_shares::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParticipantShares.def()
    }
}

impl Related<super::expense_notifications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseNotifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
