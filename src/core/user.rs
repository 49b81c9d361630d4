//! User business logic - Creating and looking up the accounts points belong to.

use crate::{
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};

/// Creates a new user after trimming and validating the email and name.
///
/// # Errors
/// Returns an error if:
/// - The email or name is empty or whitespace-only
/// - A user with the same email already exists
/// - The database insert operation fails
pub async fn create_user(db: &DatabaseConnection, email: &str, name: &str) -> Result<user::Model> {
    let email = email.trim();
    let name = name.trim();

    if email.is_empty() {
        return Err(Error::Config {
            message: "User email cannot be empty".to_string(),
        });
    }

    if name.is_empty() {
        return Err(Error::Config {
            message: "User name cannot be empty".to_string(),
        });
    }

    if get_user_by_email(db, email).await?.is_some() {
        return Err(Error::Config {
            message: format!("A user with email '{email}' already exists"),
        });
    }

    let user = user::ActiveModel {
        email: Set(email.to_string()),
        name: Set(name.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    user.insert(db).await.map_err(Into::into)
}

/// Finds a user by login email.
pub async fn get_user_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Email.eq(email.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a user by id.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Returns the user with this email, creating one named after the email's local part
/// when none exists yet.
pub async fn get_or_create_user(db: &DatabaseConnection, email: &str) -> Result<user::Model> {
    if let Some(existing) = get_user_by_email(db, email).await? {
        return Ok(existing);
    }

    let name = email.trim().split('@').next().unwrap_or_default();
    create_user(db, email, name).await
}
