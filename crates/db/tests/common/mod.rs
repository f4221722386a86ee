//! Shared setup for database integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use splitledger_core::split::{ExpenseHeader, ExpenseType, ParticipantInput, SplitRule};
use splitledger_db::entities::users;
use splitledger_db::migration::Migrator;
use splitledger_db::UserRepository;
use uuid::Uuid;

/// Database URL from the environment. Integration tests are skipped when it
/// is not set.
pub fn get_database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty())
}

/// Connects and applies pending migrations, or returns `None` when no
/// database is configured.
pub async fn setup() -> Option<DatabaseConnection> {
    let Some(url) = get_database_url() else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };
    let db = Database::connect(&url)
        .await
        .expect("Failed to connect to database");
    Migrator::up(&db, None).await.expect("Failed to migrate");
    Some(db)
}

/// Creates a user with a unique username.
pub async fn create_user(db: &DatabaseConnection, prefix: &str) -> users::Model {
    let tag = Uuid::new_v4().simple().to_string();
    let username = format!("{prefix}-{}", &tag[..12]);
    UserRepository::new(db.clone())
        .create(&username, &format!("{username}@example.com"), prefix)
        .await
        .expect("Failed to create user")
}

pub fn group_header(amount: Decimal, rule: SplitRule, friends: u32, include_self: bool) -> ExpenseHeader {
    ExpenseHeader {
        name: "Weekend trip".to_string(),
        date: NaiveDate::from_ymd_opt(2026, 5, 2).expect("valid date"),
        amount,
        note: Some("cabin".to_string()),
        expense_type: ExpenseType::Group,
        split_rule: Some(rule),
        friend_count: Some(friends),
        include_self,
    }
}

pub fn personal_header(amount: Decimal) -> ExpenseHeader {
    ExpenseHeader {
        name: "Groceries".to_string(),
        date: NaiveDate::from_ymd_opt(2026, 5, 1).expect("valid date"),
        amount,
        note: None,
        expense_type: ExpenseType::Personal,
        split_rule: None,
        friend_count: None,
        include_self: true,
    }
}

pub fn by_email(name: &str, value: Option<Decimal>) -> ParticipantInput {
    ParticipantInput {
        name: name.to_string(),
        email: Some(format!("{}-{}@friends.example", name.to_lowercase(), Uuid::new_v4().simple())),
        value,
        ..ParticipantInput::default()
    }
}

pub fn by_username(user: &users::Model, value: Option<Decimal>) -> ParticipantInput {
    ParticipantInput {
        name: user.full_name.clone(),
        username: Some(user.username.clone()),
        value,
        ..ParticipantInput::default()
    }
}
