use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "installkit")]
#[command(version, about = "Detect, validate and run package-manager installs")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Emit diagnostic logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find installable packages in a JSON file of feed updates
    Detect {
        /// JSON array of {title, content, url} records
        #[arg(short, long)]
        input: PathBuf,

        /// Print detected items as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check a command against the install policy
    Validate {
        /// The full command line as one quoted argument
        #[arg(allow_hyphen_values = true)]
        command: String,
    },
    /// Detect packages in a feed file and install the selected ones
    Install {
        #[arg(short, long)]
        input: PathBuf,

        /// Item id to install (repeatable)
        #[arg(long = "item")]
        items: Vec<String>,

        /// Install every detected item
        #[arg(long, conflicts_with = "items")]
        all: bool,

        /// Number of concurrent installs. Overrides installkit.toml.
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Show recent audit log entries
    History {
        #[arg(short, long, default_value = "20")]
        limit: usize,

        #[arg(long)]
        json: bool,
    },
    /// Remove audit log entries older than the retention period
    Prune {
        /// Retention in days. Defaults to audit.retention_days.
        #[arg(long)]
        days: Option<u32>,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default installkit.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    // Only installs leave a diagnostic log file behind.
    let log_dir = match cli.command {
        Commands::Install { .. } => Some(installkit::config::InstallConfig::log_dir(&project_dir)),
        _ => None,
    };
    let _guard = installkit::logging::init(cli.verbose, cli.log_json, log_dir.as_deref())?;

    match &cli.command {
        Commands::Detect { input, json } => cmd::cmd_detect(&project_dir, input, *json)?,
        Commands::Validate { command } => cmd::cmd_validate(&project_dir, command)?,
        Commands::Install {
            input,
            items,
            all,
            workers,
        } => cmd::cmd_install(&project_dir, input, items, *all, *workers).await?,
        Commands::History { limit, json } => cmd::cmd_history(&project_dir, *limit, *json)?,
        Commands::Prune { days } => cmd::cmd_prune(&project_dir, *days)?,
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
    }

    Ok(())
}
