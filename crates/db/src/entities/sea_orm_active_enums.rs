//! `SeaORM` active enums mapped to Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use splitledger_core::split::{ExpenseType as CoreExpenseType, SplitRule as CoreSplitRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "expense_type")]
pub enum ExpenseType {
    #[sea_orm(string_value = "personal")]
    Personal,
    #[sea_orm(string_value = "group")]
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "split_rule")]
pub enum SplitRule {
    #[sea_orm(string_value = "equal")]
    Equal,
    #[sea_orm(string_value = "exact")]
    Exact,
    #[sea_orm(string_value = "percentage")]
    Percentage,
}

impl From<CoreExpenseType> for ExpenseType {
    fn from(value: CoreExpenseType) -> Self {
        match value {
            CoreExpenseType::Personal => Self::Personal,
            CoreExpenseType::Group => Self::Group,
        }
    }
}

impl From<ExpenseType> for CoreExpenseType {
    fn from(value: ExpenseType) -> Self {
        match value {
            ExpenseType::Personal => Self::Personal,
            ExpenseType::Group => Self::Group,
        }
    }
}

impl From<CoreSplitRule> for SplitRule {
    fn from(value: CoreSplitRule) -> Self {
        match value {
            CoreSplitRule::Equal => Self::Equal,
            CoreSplitRule::Exact => Self::Exact,
            CoreSplitRule::Percentage => Self::Percentage,
        }
    }
}

impl From<SplitRule> for CoreSplitRule {
    fn from(value: SplitRule) -> Self {
        match value {
            SplitRule::Equal => Self::Equal,
            SplitRule::Exact => Self::Exact,
            SplitRule::Percentage => Self::Percentage,
        }
    }
}
