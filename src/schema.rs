//! Schema synchronisation - brings the database in line with the entity definitions.
//!
//! On startup every registered table is checked: missing tables are created and
//! existing tables get any missing columns added with `ALTER TABLE ... ADD COLUMN`.
//! Nothing is ever dropped or retyped. Only `SQLite` and `PostgreSQL` are supported.
//!
//! DDL is rendered here rather than through `Schema::create_table_from_entity` so the
//! type mapping and the primary key style (`SERIAL` or identity columns) stay under
//! our control and are identical for freshly created tables and added columns.

use crate::errors::{Error, Result};
use sea_orm::{
    ColumnTrait, ColumnType, ConnectionTrait, DatabaseBackend, EntityName, EntityTrait,
    IdenStatic, Iterable, PrimaryKeyToColumn, PrimaryKeyTrait, RelationTrait, Statement,
    TransactionTrait,
};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, error, info, instrument, warn};

/// Database flavours the schema sync knows how to talk to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    /// `SQLite`, file or in-memory
    Sqlite,
    /// `PostgreSQL`
    Postgres,
}

impl Dialect {
    /// Picks the dialect from an explicit override (the `DIALECT` setting) or,
    /// failing that, from the scheme of the database URL.
    ///
    /// # Errors
    /// Returns `Error::UnsupportedDialect` when the override or the URL scheme is
    /// neither `SQLite` nor `PostgreSQL`.
    pub fn detect(database_url: &str, override_dialect: Option<&str>) -> Result<Self> {
        if let Some(name) = override_dialect.map(str::trim).filter(|name| !name.is_empty()) {
            return match name.to_lowercase().as_str() {
                "sqlite" => Ok(Self::Sqlite),
                "postgresql" | "postgres" => Ok(Self::Postgres),
                other => Err(Error::UnsupportedDialect {
                    dialect: other.to_string(),
                }),
            };
        }

        if database_url.starts_with("sqlite") {
            Ok(Self::Sqlite)
        } else if database_url.starts_with("postgres") {
            Ok(Self::Postgres)
        } else {
            let scheme = database_url.split(':').next().unwrap_or_default();
            Err(Error::UnsupportedDialect {
                dialect: scheme.to_string(),
            })
        }
    }

    /// The `SeaORM` backend used to build statements for this dialect.
    #[must_use]
    pub const fn backend(self) -> DatabaseBackend {
        match self {
            Self::Sqlite => DatabaseBackend::Sqlite,
            Self::Postgres => DatabaseBackend::Postgres,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => f.write_str("sqlite"),
            Self::Postgres => f.write_str("postgresql"),
        }
    }
}

/// One column of a table, as far as DDL generation cares.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSpec {
    /// Column name
    pub name: String,
    /// Abstract column type from the entity definition
    pub column_type: ColumnType,
    /// Whether NULL is allowed
    pub nullable: bool,
    /// Whether a UNIQUE constraint applies
    pub unique: bool,
    /// Whether this column is (part of) the primary key
    pub primary_key: bool,
    /// Whether the database assigns values for this primary key
    pub auto_increment: bool,
}

/// A table to be synchronised.
#[derive(Clone, Debug, PartialEq)]
pub struct TableDef {
    /// Table name
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnSpec>,
    /// Whether the entity declares a `belongs_to` relation
    pub has_foreign_keys: bool,
}

impl TableDef {
    /// Builds a table definition from a `SeaORM` entity.
    pub fn from_entity<E>(entity: E) -> Self
    where
        E: EntityTrait,
    {
        let primary_keys: Vec<String> = E::PrimaryKey::iter()
            .map(|pk| pk.into_column().as_str().to_string())
            .collect();
        let auto_increment = <E::PrimaryKey as PrimaryKeyTrait>::auto_increment();

        let columns = E::Column::iter()
            .map(|column| {
                let def = column.def();
                let name = column.as_str().to_string();
                let primary_key = primary_keys.contains(&name);
                ColumnSpec {
                    column_type: def.get_column_type().clone(),
                    nullable: def.is_null(),
                    unique: def.is_unique(),
                    primary_key,
                    auto_increment: primary_key && auto_increment,
                    name,
                }
            })
            .collect();

        let has_foreign_keys = E::Relation::iter().any(|relation| !relation.def().is_owner);

        Self {
            name: entity.table_name().to_string(),
            columns,
            has_foreign_keys,
        }
    }
}

/// Knobs for [`sync_schema`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Use `GENERATED ALWAYS AS IDENTITY` instead of `SERIAL` on `PostgreSQL`
    pub use_identity: bool,
    /// Only these tables are synchronised (empty means all)
    pub include_tables: Vec<String>,
    /// These tables are skipped
    pub exclude_tables: Vec<String>,
}

/// What happened to a single table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableOutcome {
    /// The table did not exist and was created
    Created,
    /// The table existed and these columns were added
    Updated {
        /// Names of the added columns
        added: Vec<String>,
    },
    /// The table already matched
    Unchanged,
}

/// Result of a [`sync_schema`] run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncReport {
    /// Dialect the DDL was rendered for
    pub dialect: Dialect,
    /// Per-table outcome in processing order
    pub tables: Vec<(String, TableOutcome)>,
}

impl SyncReport {
    /// Outcome for a given table, if it was processed.
    #[must_use]
    pub fn outcome(&self, table: &str) -> Option<&TableOutcome> {
        self.tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, outcome)| outcome)
    }
}

/// Rejects anything that is not a plain SQL identifier.
///
/// Table and column names are interpolated into DDL, so they must be checked.
///
/// # Errors
/// Returns `Error::InvalidIdentifier` for empty names or names containing
/// characters other than ASCII letters, digits and underscores, or starting with a digit.
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}

/// Maps an entity column type onto the SQL type used for the given dialect.
#[must_use]
pub fn map_column_type(column_type: &ColumnType, dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Postgres => match column_type {
            ColumnType::Char(_) | ColumnType::String(_) => "VARCHAR",
            ColumnType::Text => "TEXT",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::TinyInteger | ColumnType::SmallInteger => "SMALLINT",
            ColumnType::Integer => "INTEGER",
            ColumnType::BigInteger => "BIGINT",
            ColumnType::Float | ColumnType::Double => "FLOAT",
            ColumnType::Decimal(_) | ColumnType::Money(_) => "NUMERIC",
            ColumnType::Date => "DATE",
            ColumnType::DateTime | ColumnType::Timestamp | ColumnType::TimestampWithTimeZone => {
                "TIMESTAMP"
            }
            _ => "TEXT",
        },
        Dialect::Sqlite => match column_type {
            ColumnType::Boolean
            | ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger => "INTEGER",
            ColumnType::Float | ColumnType::Double => "REAL",
            ColumnType::Decimal(_) | ColumnType::Money(_) => "NUMERIC",
            _ => "TEXT",
        },
    }
}

/// Renders the column definition used inside `CREATE TABLE`.
#[must_use]
pub fn column_definition(column: &ColumnSpec, dialect: Dialect, use_identity: bool) -> String {
    let sql_type = map_column_type(&column.column_type, dialect);

    let mut definition = if column.primary_key {
        match dialect {
            Dialect::Postgres if use_identity => format!(
                "{} INTEGER GENERATED ALWAYS AS IDENTITY PRIMARY KEY",
                column.name
            ),
            Dialect::Postgres => format!("{} SERIAL PRIMARY KEY", column.name),
            Dialect::Sqlite if column.auto_increment && sql_type == "INTEGER" => {
                format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", column.name)
            }
            Dialect::Sqlite => format!("{} {sql_type} PRIMARY KEY", column.name),
        }
    } else {
        format!("{} {sql_type}", column.name)
    };

    if !column.nullable && !column.primary_key {
        definition.push_str(" NOT NULL");
    }
    if column.unique {
        definition.push_str(" UNIQUE");
    }
    definition
}

/// Renders `CREATE TABLE` for a whole table.
///
/// # Errors
/// Returns `Error::InvalidIdentifier` if the table or a column name is not a plain identifier.
pub fn create_table_sql(table: &TableDef, dialect: Dialect, use_identity: bool) -> Result<String> {
    validate_identifier(&table.name)?;
    let columns = table
        .columns
        .iter()
        .map(|column| {
            validate_identifier(&column.name)?;
            Ok(column_definition(column, dialect, use_identity))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(format!(
        "CREATE TABLE {} (\n    {}\n)",
        table.name,
        columns.join(",\n    ")
    ))
}

/// Renders `ALTER TABLE ... ADD COLUMN` for one missing column.
///
/// # Errors
/// Returns `Error::InvalidIdentifier` if the table or column name is not a plain identifier.
pub fn add_column_sql(table: &TableDef, column: &ColumnSpec, dialect: Dialect) -> Result<String> {
    validate_identifier(&table.name)?;
    validate_identifier(&column.name)?;

    let not_null = if column.nullable { "" } else { " NOT NULL" };
    let unique = if column.unique { " UNIQUE" } else { "" };
    Ok(format!(
        "ALTER TABLE {} ADD COLUMN {} {}{not_null}{unique}",
        table.name,
        column.name,
        map_column_type(&column.column_type, dialect)
    ))
}

/// Applies the include/exclude filters and orders tables without foreign keys first.
#[must_use]
pub fn plan_tables(tables: &[TableDef], options: &SyncOptions) -> Vec<TableDef> {
    let mut planned: Vec<TableDef> = tables
        .iter()
        .filter(|table| {
            options.include_tables.is_empty() || options.include_tables.contains(&table.name)
        })
        .filter(|table| !options.exclude_tables.contains(&table.name))
        .cloned()
        .collect();

    planned.sort_by(|a, b| {
        (a.has_foreign_keys, &a.name).cmp(&(b.has_foreign_keys, &b.name))
    });
    planned
}

async fn table_exists<C>(conn: &C, dialect: Dialect, table: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    validate_identifier(table)?;
    let sql = match dialect {
        Dialect::Sqlite => "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
        Dialect::Postgres => {
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = $1"
        }
    };
    let row = conn
        .query_one(Statement::from_sql_and_values(
            dialect.backend(),
            sql,
            [table.into()],
        ))
        .await?;
    Ok(row.is_some())
}

async fn existing_columns<C>(conn: &C, dialect: Dialect, table: &str) -> Result<HashSet<String>>
where
    C: ConnectionTrait,
{
    validate_identifier(table)?;
    let (sql, field) = match dialect {
        Dialect::Sqlite => ("SELECT name FROM pragma_table_info(?)", "name"),
        Dialect::Postgres => (
            "SELECT column_name::text AS column_name FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name = $1",
            "column_name",
        ),
    };
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            dialect.backend(),
            sql,
            [table.into()],
        ))
        .await?;

    rows.iter()
        .map(|row| row.try_get::<String>("", field).map_err(Error::from))
        .collect()
}

async fn sync_table<C>(
    conn: &C,
    table: &TableDef,
    dialect: Dialect,
    use_identity: bool,
) -> Result<TableOutcome>
where
    C: ConnectionTrait,
{
    validate_identifier(&table.name)?;

    if !table_exists(conn, dialect, &table.name).await? {
        let sql = create_table_sql(table, dialect, use_identity)?;
        debug!("{sql}");
        conn.execute_unprepared(&sql).await?;
        return Ok(TableOutcome::Created);
    }

    let existing = existing_columns(conn, dialect, &table.name).await?;
    let mut added = Vec::new();
    for column in table.columns.iter().filter(|c| !existing.contains(&c.name)) {
        let sql = add_column_sql(table, column, dialect)?;
        debug!("{sql}");
        conn.execute_unprepared(&sql).await?;
        added.push(column.name.clone());
    }

    if added.is_empty() {
        Ok(TableOutcome::Unchanged)
    } else {
        Ok(TableOutcome::Updated { added })
    }
}

/// Creates or alters tables so that they match the given definitions.
///
/// All changes run inside a single transaction; on error nothing is committed.
///
/// # Errors
/// Returns an error if a name is not a valid identifier or if any statement fails.
#[instrument(skip_all, fields(dialect = %dialect))]
pub async fn sync_schema<D>(
    db: &D,
    tables: &[TableDef],
    dialect: Dialect,
    options: &SyncOptions,
) -> Result<SyncReport>
where
    D: ConnectionTrait + TransactionTrait,
{
    let mut report = SyncReport {
        dialect,
        tables: Vec::new(),
    };

    if tables.is_empty() {
        warn!("No tables registered; make sure the entities are listed for schema sync");
        return Ok(report);
    }

    let planned = plan_tables(tables, options);
    info!(
        "Synchronising tables: {:?}",
        planned.iter().map(|t| t.name.as_str()).collect::<Vec<_>>()
    );

    let result: Result<()> = async {
        let txn = db.begin().await?;
        for table in &planned {
            let outcome = sync_table(&txn, table, dialect, options.use_identity).await?;
            match &outcome {
                TableOutcome::Created => info!("Table created: {}", table.name),
                TableOutcome::Updated { added } => info!(
                    "Table updated: {} ({} new columns)",
                    table.name,
                    added.len()
                ),
                TableOutcome::Unchanged => info!("Table verified: {} (no changes)", table.name),
            }
            report.tables.push((table.name.clone(), outcome));
        }
        txn.commit().await?;
        Ok(())
    }
    .await;

    result.inspect_err(|e| error!("Schema synchronisation failed: {e}"))?;
    Ok(report)
}
