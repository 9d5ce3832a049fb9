use api_base::{
    api::{self, AppState},
    auth::JwtKeys,
    config::{AppConfig, database},
    errors::Result,
};
use clap::{ArgAction, Parser, Subcommand};
use dotenvy::dotenv;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Command line options and arguments
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file (defaults to ./config.toml when present)
    #[arg(short, long, env = "APP_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v DEBUG, -vv TRACE); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Synchronise the schema, then serve the API (default)
    Serve {
        /// Address to bind, overrides HOST
        #[arg(long)]
        host: Option<String>,
        /// TCP port, overrides PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Synchronise the database schema and exit
    SyncSchema,
}

impl Cli {
    fn default_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(|| {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            default.exists().then(|| default.to_path_buf())
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env file (non-fatal, env vars can be set externally)
    let dotenv_loaded = dotenv().is_ok();
    let cli = Cli::parse();

    // 2. Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.default_filter())),
        )
        .init();
    if dotenv_loaded {
        info!("Loaded environment from .env");
    }

    // 3. Load the application configuration
    let mut config = AppConfig::load(cli.config_path().as_deref())
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;
    let jwt = JwtKeys::new(&config.jwt)
        .inspect_err(|e| error!("Invalid token configuration: {e}"))?;

    let command = cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    });
    if matches!(command, Command::SyncSchema) {
        config.schema.enabled = true;
    }

    // 4. Connect and bring the schema up to date
    let db = database::create_connection(&config.database)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::sync_registered_tables(&db, &config.database, &config.schema)
        .await
        .inspect_err(|e| error!("Schema sync failed: {e}"))?;

    match command {
        Command::SyncSchema => {
            info!("Schema synchronised, exiting");
            Ok(())
        }
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            // 5. Run the server
            api::serve(&config.server, AppState::new(db, jwt)).await
        }
    }
}
