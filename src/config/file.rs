//! Optional `config.toml` loading.
//!
//! Every field is optional: the file only provides defaults that environment
//! variables can override. A missing file is not an error for the application,
//! but [`load_config`] itself reports it so callers can decide.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Structure of the whole `config.toml` file
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    /// `[server]` table
    pub server: ServerSection,
    /// `[database]` table
    pub database: DatabaseSection,
    /// `[jwt]` table
    pub jwt: JwtSection,
    /// `[schema]` table
    pub schema: SchemaSection,
}

/// `[server]` table
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerSection {
    /// Address to bind
    pub host: Option<String>,
    /// TCP port to listen on
    pub port: Option<u16>,
}

/// `[database]` table
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseSection {
    /// Connection URL
    pub url: Option<String>,
    /// Explicit dialect, overrides detection from the URL
    pub dialect: Option<String>,
    /// Log every SQL statement
    pub echo: Option<bool>,
}

/// `[jwt]` table
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JwtSection {
    /// Signing secret
    pub secret: Option<String>,
    /// Algorithm name (`HS256`, `HS384`, `HS512`)
    pub algorithm: Option<String>,
    /// Token lifetime
    pub expire_minutes: Option<i64>,
}

/// `[schema]` table
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SchemaSection {
    /// Run schema sync on startup
    pub sync: Option<bool>,
    /// Identity columns instead of `SERIAL` on `PostgreSQL`
    pub use_identity: Option<bool>,
    /// Only synchronise these tables
    pub include_tables: Vec<String>,
    /// Never synchronise these tables
    pub exclude_tables: Vec<String>,
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field has the wrong type
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}
