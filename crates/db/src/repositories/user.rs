//! User directory repository.
//!
//! Users are owned by the identity service; the ledger only reads them to
//! resolve owners, check participant usernames and look up reminder emails.

use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::users;

/// User repository for directory lookups.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds a user by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
    }

    /// Returns the subset of `usernames` that belong to registered users.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn existing_usernames(&self, usernames: &[&str]) -> Result<HashSet<String>, DbErr> {
        registered_usernames(&self.db, usernames.iter().copied()).await
    }

    /// Maps registered usernames to their email addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn emails_for_usernames(
        &self,
        usernames: &[&str],
    ) -> Result<HashMap<String, String>, DbErr> {
        emails_by_username(&self.db, usernames.iter().copied()).await
    }

    /// Creates a directory entry. Used by the seeder and tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        full_name: &str,
    ) -> Result<users::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::now_v7()),
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            full_name: Set(full_name.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user.insert(&self.db).await
    }
}

/// Looks up which of `usernames` are registered, on any connection.
pub(crate) async fn registered_usernames<'a, C>(
    db: &C,
    usernames: impl IntoIterator<Item = &'a str>,
) -> Result<HashSet<String>, DbErr>
where
    C: ConnectionTrait,
{
    let wanted: Vec<&str> = usernames.into_iter().collect();
    if wanted.is_empty() {
        return Ok(HashSet::new());
    }

    let found = users::Entity::find()
        .filter(users::Column::Username.is_in(wanted))
        .all(db)
        .await?;

    Ok(found.into_iter().map(|u| u.username).collect())
}

/// Maps registered usernames to emails, on any connection.
pub(crate) async fn emails_by_username<'a, C>(
    db: &C,
    usernames: impl IntoIterator<Item = &'a str>,
) -> Result<HashMap<String, String>, DbErr>
where
    C: ConnectionTrait,
{
    let wanted: Vec<&str> = usernames.into_iter().collect();
    if wanted.is_empty() {
        return Ok(HashMap::new());
    }

    let found = users::Entity::find()
        .filter(users::Column::Username.is_in(wanted))
        .all(db)
        .await?;

    Ok(found.into_iter().map(|u| (u.username, u.email)).collect())
}
