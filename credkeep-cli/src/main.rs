//! credkeep CLI
//!
//! Command-line interface for inspecting and editing stored credentials.
//!
//! # Usage
//!
//! ```bash
//! # Store a credential
//! credkeep store alice --access-token ya29.a0 --refresh-token 1//0g --expires-in 3600
//!
//! # Show it (tokens redacted unless --reveal)
//! credkeep load alice --format json
//!
//! # Remove it
//! credkeep delete alice
//! ```

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use credkeep_cli::commands::{self, NewCredential, OutputFormat};
use credkeep_core::{Config, open_store};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "credkeep")]
#[command(about = "Per-user OAuth2 credential storage")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a credential, replacing any existing one for the user
    Store {
        /// User identifier
        user: String,

        /// Access token
        #[arg(long)]
        access_token: Option<String>,

        /// Refresh token
        #[arg(long)]
        refresh_token: Option<String>,

        /// Seconds until the access token expires
        #[arg(long, allow_negative_numbers = true)]
        expires_in: Option<i64>,

        /// Granted scopes (comma-separated)
        #[arg(short, long)]
        scopes: Option<String>,
    },

    /// Show the stored credential for a user
    Load {
        /// User identifier
        user: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Print token values instead of [REDACTED]
        #[arg(long)]
        reveal: bool,
    },

    /// Delete the stored credential for a user
    Delete {
        /// User identifier
        user: String,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_logging(&config, cli.verbose);
    debug!(?config, "configuration loaded");

    let mut out = io::stdout().lock();

    if let Commands::Config = cli.command {
        return commands::show_config(&config, &mut out);
    }

    let store = open_store(&config).context("failed to open credential store")?;

    match cli.command {
        Commands::Store {
            user,
            access_token,
            refresh_token,
            expires_in,
            scopes,
        } => {
            let fields = NewCredential {
                access_token,
                refresh_token,
                expires_in,
                scopes,
            };
            commands::store_credential(&*store, &user, fields, &mut out)
        }
        Commands::Load {
            user,
            format,
            reveal,
        } => commands::load_credential(&*store, &user, format, reveal, &mut out),
        Commands::Delete { user } => commands::delete_credential(&*store, &user, &mut out),
        Commands::Config => Ok(()),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("failed to load config from {:?}", path)),
        None => Config::load().context("failed to load config"),
    }
}

fn init_logging(config: &Config, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
