//! `SeaORM` entity definitions.

pub mod expense_notifications;
pub mod expenses;
pub mod participant_shares;
pub mod sea_orm_active_enums;
pub mod users;
