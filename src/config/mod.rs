//! Application configuration.
//!
//! Values are resolved in increasing order of precedence: built-in defaults,
//! the optional `config.toml`, then environment variables (a `.env` file is
//! loaded into the environment by `main`).

/// Database configuration and connection management
pub mod database;

/// `config.toml` parsing
pub mod file;

use crate::errors::{Error, Result};
use crate::schema::SyncOptions;
use file::FileConfig;
use std::path::Path;
use std::str::FromStr;

/// Default bind address
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default TCP port
pub const DEFAULT_PORT: u16 = 8000;
/// Default JWT signing algorithm
pub const DEFAULT_JWT_ALGORITHM: &str = "HS256";
/// Default token lifetime in minutes
pub const DEFAULT_JWT_EXPIRE_MINUTES: i64 = 30;

/// Fully resolved configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Database settings
    pub database: DatabaseConfig,
    /// Token settings
    pub jwt: JwtConfig,
    /// Schema synchronisation settings
    pub schema: SchemaSyncConfig,
}

/// HTTP listener settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl ServerConfig {
    /// `host:port` string suitable for `TcpListener::bind`
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Connection URL (`sqlite://...` or `postgres://...`)
    pub url: String,
    /// Explicit dialect override
    pub dialect: Option<String>,
    /// Log every SQL statement
    pub log_statements: bool,
}

/// Token settings
#[derive(Clone, PartialEq, Eq)]
pub struct JwtConfig {
    /// HMAC secret
    pub secret: String,
    /// Algorithm name
    pub algorithm: String,
    /// Token lifetime in minutes
    pub expire_minutes: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("expire_minutes", &self.expire_minutes)
            .finish()
    }
}

/// Schema synchronisation settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaSyncConfig {
    /// Run the sync before serving
    pub enabled: bool,
    /// Options handed to the sync
    pub options: SyncOptions,
}

impl AppConfig {
    /// Loads configuration from the process environment and, if given, a TOML file.
    ///
    /// # Errors
    /// Returns `Error::Config` if the file is unreadable or invalid, a required
    /// value (`DATABASE_URL`, `JWT_SECRET`) is missing, or a value fails to parse.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => file::load_config(path)?,
            None => FileConfig::default(),
        };
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Builds the configuration from a parsed file and an environment lookup.
    ///
    /// # Errors
    /// Returns `Error::Config` if a required value is missing or a value fails to parse.
    pub fn from_sources<F>(file: FileConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = ServerConfig {
            host: env("HOST")
                .or(file.server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_env(&env, "PORT")?
                .or(file.server.port)
                .unwrap_or(DEFAULT_PORT),
        };

        let database = DatabaseConfig {
            url: env("DATABASE_URL")
                .or(file.database.url)
                .ok_or_else(|| missing("DATABASE_URL"))?,
            dialect: env("DIALECT").or(file.database.dialect),
            log_statements: parse_env(&env, "DATABASE_ECHO")?
                .or(file.database.echo)
                .unwrap_or(true),
        };

        let jwt = JwtConfig {
            secret: env("JWT_SECRET")
                .or(file.jwt.secret)
                .filter(|secret| !secret.is_empty())
                .ok_or_else(|| missing("JWT_SECRET"))?,
            algorithm: env("JWT_ALGORITHM")
                .or(file.jwt.algorithm)
                .unwrap_or_else(|| DEFAULT_JWT_ALGORITHM.to_string()),
            expire_minutes: parse_env(&env, "JWT_EXPIRE_MINUTES")?
                .or(file.jwt.expire_minutes)
                .unwrap_or(DEFAULT_JWT_EXPIRE_MINUTES),
        };
        if jwt.expire_minutes <= 0 {
            return Err(Error::Config {
                message: format!(
                    "JWT_EXPIRE_MINUTES must be positive, got {}",
                    jwt.expire_minutes
                ),
            });
        }

        let schema = SchemaSyncConfig {
            enabled: parse_env(&env, "SCHEMA_SYNC")?
                .or(file.schema.sync)
                .unwrap_or(true),
            options: SyncOptions {
                use_identity: parse_env(&env, "SCHEMA_USE_IDENTITY")?
                    .or(file.schema.use_identity)
                    .unwrap_or(false),
                include_tables: file.schema.include_tables,
                exclude_tables: file.schema.exclude_tables,
            },
        };

        Ok(Self {
            server,
            database,
            jwt,
            schema,
        })
    }
}

fn missing(key: &str) -> Error {
    Error::Config {
        message: format!("{key} is not set"),
    }
}

fn parse_env<F, T>(env: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| Error::Config {
                message: format!("Invalid value for {key} ({raw:?}): {e}"),
            })
        })
        .transpose()
}
