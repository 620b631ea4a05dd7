//! ACM CLI - Command-line interface for the access-control matrix
//!
//! Administrators use it to:
//! - Create subjects and grant or withdraw their rights
//! - Add, rename and delete subjects and objects
//! - Show, export and import the matrix
//!
//! Users use it to:
//! - Look up the rights of a subject
//! - Filter text through those rights, once or continuously

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
pub mod output;

use access_matrix::{AdminConsole, FileAuditLog, JsonFileStorage, DEFAULT_AUDIT_FILE};
use commands::{admin, user};
pub use error::{CliError, CliResult};
use output::OutputFormat;

/// ACM CLI application
#[derive(Parser)]
#[command(name = "acm")]
#[command(about = "ACM - Access-control matrix administration and filtering", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "ACM_CONFIG")]
    config: Option<String>,

    /// Matrix file (overrides the configured one)
    #[arg(short, long, env = "ACM_DATA_FILE")]
    data_file: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    output: OutputFormat,

    /// Audit log for admin commands (overrides the configured one)
    #[arg(long)]
    audit_log: Option<PathBuf>,

    /// Do not record admin commands
    #[arg(long, conflicts_with = "audit_log")]
    no_audit: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Change the matrix
    Admin {
        #[command(subcommand)]
        command: admin::AdminCommands,
    },

    /// Read the matrix as a subject
    User {
        #[command(subcommand)]
        command: user::UserCommands,
    },

    /// Show configuration
    Config,
}

/// Run using the current process arguments.
pub async fn run() -> CliResult<()> {
    run_with_args(std::env::args_os()).await
}

/// Run using the provided argument iterator.
pub async fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();

    // Load config, then apply overrides
    let mut config = config::load(cli.config.as_deref())?;
    if let Some(path) = cli.data_file {
        config.data_file = path;
    }
    if cli.audit_log.is_some() {
        config.audit_log = cli.audit_log;
    }
    debug!(data_file = %config.data_file.display(), "configuration loaded");
    let storage = JsonFileStorage::new(config.data_file.clone());

    match cli.command {
        Commands::Admin { command } => {
            let (console, load_error) = AdminConsole::open(storage);
            admin::guard_load_error(&command, load_error)?;
            let mut console = if cli.no_audit {
                console
            } else {
                let path = config
                    .audit_log
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_AUDIT_FILE));
                console.with_audit(FileAuditLog::new(path))
            };
            admin::execute(command, &mut console, cli.output)
        }
        Commands::User { command } => user::execute(command, storage, &config, cli.output).await,
        Commands::Config => {
            match cli.output {
                OutputFormat::Table => {
                    let text =
                        toml::to_string_pretty(&config).map_err(|e| CliError::Config(e.to_string()))?;
                    print!("{}", text);
                }
                OutputFormat::Json => output::print_json(&config)?,
            }
            Ok(())
        }
    }
}
