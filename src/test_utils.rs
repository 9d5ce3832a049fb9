//! Shared test utilities for `api-base`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    auth::JwtKeys,
    config::JwtConfig,
    core::{
        item::{self, NewItem},
        user,
    },
    entities,
    errors::Result,
    schema::{self, Dialect, SyncOptions},
};
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Password used by [`create_test_user`].
pub const TEST_PASSWORD: &str = "correct horse battery staple";

/// Routes tracing output through the test harness; safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates an in-memory `SQLite` database whose tables come from [`sync_schema`],
/// the DDL used at startup, instead of `SeaORM`'s own.
///
/// [`sync_schema`]: crate::schema::sync_schema
pub async fn setup_synced_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    schema::sync_schema(
        &db,
        &entities::registered_tables(),
        Dialect::Sqlite,
        &SyncOptions::default(),
    )
    .await?;
    Ok(db)
}

/// Token keys with a fixed secret, `HS256`, and a 30 minute lifetime.
#[allow(clippy::expect_used)]
pub fn test_jwt_keys() -> JwtKeys {
    JwtKeys::new(&JwtConfig {
        secret: "test-secret".to_string(),
        algorithm: "HS256".to_string(),
        expire_minutes: 30,
    })
    .expect("HS256 is always supported")
}

/// Registers a user with [`TEST_PASSWORD`].
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
) -> Result<entities::user::Model> {
    user::register(db, email, TEST_PASSWORD).await
}

/// Creates a test item with sensible defaults.
///
/// # Defaults
/// * `description`: `"Test item"`
/// * `price`: 10.0
pub async fn create_test_item(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::item::Model> {
    item::create_item(
        db,
        NewItem {
            name: name.to_string(),
            description: Some("Test item".to_string()),
            price: 10.0,
        },
    )
    .await
}
