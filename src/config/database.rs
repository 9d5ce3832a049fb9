//! Database connection management.
//!
//! This module opens the `SeaORM` connection described by [`DatabaseConfig`] and
//! brings the schema up to date with the registered entities. [`create_tables`]
//! builds the tables straight from the entity definitions with
//! `Schema::create_table_from_entity` and is what tests use for a fresh database.

use crate::config::{DatabaseConfig, SchemaSyncConfig};
use crate::entities::{self, Item, User};
use crate::errors::Result;
use crate::schema::{self, Dialect, SyncReport};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::info;

/// Opens a connection pool for the configured database URL.
///
/// Statement logging follows `log_statements`.
///
/// # Errors
/// Returns an error if the URL is invalid or the database is unreachable.
pub async fn create_connection(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(config.url.clone());
    options.sqlx_logging(config.log_statements);

    let db = Database::connect(options).await?;
    info!("Connected to {:?} database", db.get_database_backend());
    Ok(db)
}

/// Synchronises every registered table with the database, if enabled.
///
/// Returns `None` when schema sync is switched off.
///
/// # Errors
/// Returns an error if the dialect is unsupported or any DDL statement fails.
pub async fn sync_registered_tables(
    db: &DatabaseConnection,
    database: &DatabaseConfig,
    schema_config: &SchemaSyncConfig,
) -> Result<Option<SyncReport>> {
    if !schema_config.enabled {
        info!("Schema sync disabled, leaving tables untouched");
        return Ok(None);
    }

    let dialect = Dialect::detect(&database.url, database.dialect.as_deref())?;
    info!("Using dialect: {dialect}");
    let report = schema::sync_schema(
        db,
        &entities::registered_tables(),
        dialect,
        &schema_config.options,
    )
    .await?;
    Ok(Some(report))
}

/// Creates all tables directly from the entity definitions.
///
/// # Errors
/// Returns an error if a `CREATE TABLE` statement fails (for example when the table exists).
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let user_table = schema.create_table_from_entity(User);
    let item_table = schema.create_table_from_entity(Item);

    db.execute(builder.build(&user_table)).await?;
    db.execute(builder.build(&item_table)).await?;

    Ok(())
}
