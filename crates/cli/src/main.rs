//! sgw-refresh CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli_lib::{config, logging};
use std::path::PathBuf;

mod cmd;
mod util;

/// sgw-refresh - Debounced file share cache refresh for bucket changes
#[derive(Parser)]
#[command(name = "sgw-refresh")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: $SGW_REFRESH_CONFIG or the per-user config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Debounce one change notification batch
    Debounce {
        /// Batch file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Dispatch one released trigger batch
    Dispatch {
        /// Batch file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Dispatch triggers whose delay has elapsed
    Pump {
        /// Maximum triggers per drain
        #[arg(long, default_value = "10")]
        max: usize,
    },
    /// Debounce NDJSON batches from stdin while pumping due triggers
    Run {
        /// Spool poll interval in milliseconds
        #[arg(long, default_value = "1000")]
        poll_ms: u64,
    },
    /// Show a bucket's debounce record and pending triggers
    Status {
        /// Bucket name
        bucket: String,
    },
    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,
    /// Get a single configuration value
    Get {
        /// Key, e.g. debounce.window_secs
        key: String,
    },
    /// Show the config file path
    Path {
        /// Create a default config file if missing
        #[arg(long)]
        create: bool,
    },
    /// Show an annotated example configuration
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    if let Commands::Config(command) = &cli.command {
        return match command {
            ConfigCommands::List => cmd::config::run_list(config_path).await,
            ConfigCommands::Get { key } => cmd::config::run_get(config_path, key).await,
            ConfigCommands::Path { create } => cmd::config::run_path(config_path, *create).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        };
    }

    let config = config::load(config_path)?;
    let _log_guard = logging::init_logging(&config.log)?;

    match cli.command {
        Commands::Debounce { input } => cmd::debounce::run(&config, input.as_deref()).await,
        Commands::Dispatch { input } => cmd::dispatch::run(&config, input.as_deref()).await,
        Commands::Pump { max } => cmd::pump::run(&config, max).await,
        Commands::Run { poll_ms } => cmd::run::run(&config, poll_ms).await,
        Commands::Status { bucket } => cmd::status::run(&config, &bucket).await,
        Commands::Config(_) => Ok(()),
    }
}
