//! User business logic - Registration, login, and lookups.
//!
//! Passwords are only ever stored as bcrypt hashes, and the hash never leaves this
//! module: callers get a [`UserPublic`] for anything that is sent back to a client.

use crate::{
    auth::{JwtKeys, hash_password, verify_password},
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{Set, SqlErr, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// A user as exposed over the API, without the password hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPublic {
    /// User id
    pub id: i32,
    /// Login email
    pub email: String,
}

impl From<user::Model> for UserPublic {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
        }
    }
}

/// Email and password pair used for both registration and login.
#[derive(Clone, Debug, Deserialize)]
pub struct Credentials {
    /// Login email
    pub email: String,
    /// Plain-text password
    pub password: String,
}

/// Successful login payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Signed JWT
    pub access_token: String,
    /// Always `"bearer"`
    pub token_type: String,
    /// The logged in user
    pub user_data: UserPublic,
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(Error::Validation {
            message: "Email cannot be empty".to_string(),
        });
    }
    if !email.contains('@') {
        return Err(Error::Validation {
            message: format!("Invalid email address: {email}"),
        });
    }
    Ok(email.to_string())
}

/// Finds a user by id.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_user_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<user::Model>> {
    User::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Finds a user by exact email.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new user with a hashed password.
///
/// # Errors
/// Returns an error if:
/// - The email is empty or has no `@`
/// - The password is empty
/// - Another user already has this email
/// - Hashing or the database insert fails
#[instrument(skip(db, password))]
pub async fn register(db: &DatabaseConnection, email: &str, password: &str) -> Result<user::Model> {
    let email = normalize_email(email)?;
    if password.is_empty() {
        return Err(Error::Validation {
            message: "Password cannot be empty".to_string(),
        });
    }

    if get_user_by_email(db, &email).await?.is_some() {
        return Err(Error::EmailTaken { email });
    }

    let user = user::ActiveModel {
        email: Set(email.clone()),
        password: Set(hash_password(password)?),
        ..Default::default()
    };
    // A concurrent registration can win between the lookup and the insert.
    let user = user.insert(db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::EmailTaken { email },
        _ => e.into(),
    })?;
    info!("Registered user {} (ID: {})", user.email, user.id);
    Ok(user)
}

/// Checks credentials and issues a bearer token.
///
/// Unknown emails and wrong passwords produce the same error.
///
/// # Errors
/// Returns `Error::InvalidCredentials` on a bad email/password pair, or an
/// error if the database query or token signing fails.
#[instrument(skip(db, keys, password))]
pub async fn login(
    db: &DatabaseConnection,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> Result<LoginResponse> {
    let user = get_user_by_email(db, email.trim())
        .await?
        .filter(|user| verify_password(password, &user.password))
        .ok_or(Error::InvalidCredentials)?;

    let access_token = keys.issue(user.id, &user.email)?;
    info!("User {} logged in", user.id);

    Ok(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        user_data: user.into(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_register_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = register(&db, "   ", "pw").await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = register(&db, "not-an-email", "pw").await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = register(&db, "ada@example.com", "").await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_register_stores_hash() -> Result<()> {
        let db = setup_test_db().await?;

        let user = register(&db, "  ada@example.com ", "correct horse").await?;
        assert_eq!(user.email, "ada@example.com");
        assert_ne!(user.password, "correct horse");
        assert!(verify_password("correct horse", &user.password));

        let fetched = get_user_by_id(&db, user.id).await?.unwrap();
        assert_eq!(fetched, user);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_duplicate_email() -> Result<()> {
        let db = setup_test_db().await?;
        register(&db, "ada@example.com", "one").await?;

        let result = register(&db, "ada@example.com", "two").await;
        assert!(matches!(result, Err(Error::EmailTaken { email }) if email == "ada@example.com"));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_registration_conflicts() -> Result<()> {
        let db = setup_test_db().await?;

        let (first, second) = tokio::join!(
            register(&db, "ada@example.com", "one"),
            register(&db, "ada@example.com", "two"),
        );
        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(r, Err(Error::EmailTaken { .. }))));
        Ok(())
    }

    #[tokio::test]
    async fn test_unique_violation_maps_to_email_taken() -> Result<()> {
        let db = setup_test_db().await?;
        register(&db, "ada@example.com", "one").await?;

        // Skip the lookup and hit the UNIQUE index directly.
        let duplicate = user::ActiveModel {
            email: Set("ada@example.com".to_string()),
            password: Set(hash_password("two")?),
            ..Default::default()
        };
        let err = duplicate.insert(&db).await.unwrap_err();
        assert!(matches!(
            err.sql_err(),
            Some(SqlErr::UniqueConstraintViolation(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_login_success() -> Result<()> {
        let db = setup_test_db().await?;
        let keys = test_jwt_keys();
        let user = create_test_user(&db, "ada@example.com").await?;

        let response = login(&db, &keys, "ada@example.com", TEST_PASSWORD).await?;
        assert_eq!(response.token_type, "bearer");
        assert_eq!(response.user_data, UserPublic::from(user.clone()));

        let auth = keys.verify(&response.access_token)?;
        assert_eq!(auth.user_id, user.id);
        assert_eq!(auth.email, "ada@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn test_login_failures_look_the_same() -> Result<()> {
        let db = setup_test_db().await?;
        let keys = test_jwt_keys();
        create_test_user(&db, "ada@example.com").await?;

        let wrong_password = login(&db, &keys, "ada@example.com", "wrong").await;
        let unknown_user = login(&db, &keys, "bob@example.com", TEST_PASSWORD).await;

        assert!(matches!(wrong_password, Err(Error::InvalidCredentials)));
        assert!(matches!(unknown_user, Err(Error::InvalidCredentials)));
        Ok(())
    }

    #[test]
    fn test_public_user_has_no_password() {
        let public = UserPublic::from(user::Model {
            id: 3,
            email: "ada@example.com".to_string(),
            password: "$2b$04$hash".to_string(),
        });
        let json = serde_json::to_value(&public).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 3, "email": "ada@example.com" }));
    }
}
