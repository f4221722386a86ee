//! Database seeder for SplitLedger development and testing.
//!
//! Seeds a few demo users and one group expense, then prints a bearer token
//! for the demo owner so the API can be exercised with curl.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use splitledger_core::split::{ExpenseHeader, ExpenseType, ParticipantInput, SplitRule};
use splitledger_db::entities::users;
use splitledger_db::repositories::CreateExpenseInput;
use splitledger_db::{ExpenseRepository, UserRepository};
use splitledger_shared::{AppConfig, JwtService};

/// Demo users: (username, email, full name). The first one owns the seeded expense.
const DEMO_USERS: [(&str, &str, &str); 3] = [
    ("ravi", "ravi@splitledger.dev", "Ravi Kumar"),
    ("asha", "asha@splitledger.dev", "Asha Rao"),
    ("vikram", "vikram@splitledger.dev", "Vikram Shah"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    println!("Connecting to database...");
    let db = splitledger_db::connect(&config.database.url).await?;

    println!("Seeding demo users...");
    let mut seeded = Vec::with_capacity(DEMO_USERS.len());
    for (username, email, full_name) in DEMO_USERS {
        seeded.push(seed_user(&db, username, email, full_name).await?);
    }

    let (owner, friends) = seeded
        .split_first()
        .context("no demo users configured")?;

    println!("Seeding demo group expense...");
    seed_group_expense(&db, owner, friends).await?;

    let jwt = JwtService::new(&config.jwt);
    let token = jwt.generate_access_token(owner.id, &owner.username)?;

    println!("Seeding complete!");
    println!("Bearer token for {}:\n{token}", owner.username);

    Ok(())
}

/// Returns the existing user or creates it.
async fn seed_user(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    full_name: &str,
) -> anyhow::Result<users::Model> {
    let repo = UserRepository::new(db.clone());
    if let Some(existing) = repo.find_by_username(username).await? {
        println!("  {username} already exists, skipping...");
        return Ok(existing);
    }

    let user = repo.create(username, email, full_name).await?;
    println!("  Created {username} ({})", user.id);
    Ok(user)
}

/// Seeds one equal split between the owner, every other demo user and one
/// guest without an account.
async fn seed_group_expense(
    db: &DatabaseConnection,
    owner: &users::Model,
    friends: &[users::Model],
) -> anyhow::Result<()> {
    let repo = ExpenseRepository::new(db.clone());

    let mut participants: Vec<ParticipantInput> = friends
        .iter()
        .map(|friend| ParticipantInput {
            name: friend.full_name.clone(),
            username: Some(friend.username.clone()),
            ..ParticipantInput::default()
        })
        .collect();
    participants.push(ParticipantInput {
        name: "Meera".to_string(),
        email: Some("meera@guest.example".to_string()),
        note: Some("pays by bank transfer".to_string()),
        ..ParticipantInput::default()
    });

    let friend_count = u32::try_from(participants.len())?;
    let header = ExpenseHeader {
        name: "Goa trip".to_string(),
        date: (Utc::now() - Duration::days(3)).date_naive(),
        amount: Decimal::new(1_000_000, 2),
        note: Some("villa and scooters".to_string()),
        expense_type: ExpenseType::Group,
        split_rule: Some(SplitRule::Equal),
        friend_count: Some(friend_count),
        include_self: true,
    };

    let created = repo
        .create_expense(owner.id, CreateExpenseInput { header, participants })
        .await?;

    println!("  Created expense {} with {} shares", created.expense.id, created.shares.len());
    for share in &created.shares {
        println!(
            "    {:<12} {:>10} paid={}",
            share.name, share.amount, share.is_paid
        );
    }

    Ok(())
}
