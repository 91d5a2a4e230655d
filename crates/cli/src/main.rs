//! Settle CLI - settle command

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

/// Settle - emit only the last line of each burst of input
#[derive(Parser)]
#[command(name = "settle")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read lines from stdin and emit the latest one after a quiet period
    Run {
        /// Quiet period in milliseconds (default: from config, else 200)
        #[arg(short, long, allow_negative_numbers = true)]
        delay_ms: Option<i64>,

        /// Label used in log output and failure reports
        #[arg(short, long)]
        label: Option<String>,

        /// Prefix emitted lines with the local time
        #[arg(short, long)]
        timestamps: bool,

        /// Command to run for each settled line, with the line appended as
        /// its last argument; takes every remaining argument, so give it last
        #[arg(short = 'x', long, value_name = "CMD", num_args = 1.., allow_hyphen_values = true)]
        exec: Vec<String>,
    },
    /// View or edit configuration
    Config {
        /// List all configuration values (default)
        #[arg(long)]
        list: bool,

        /// Print a single value
        #[arg(long, value_name = "KEY")]
        get: Option<String>,

        /// Set a value
        #[arg(long, num_args = 2, value_names = ["KEY", "VALUE"])]
        set: Option<Vec<String>>,

        /// Print the config file path
        #[arg(long)]
        path: bool,

        /// Create the config file with defaults if missing (with --path)
        #[arg(long, requires = "path")]
        create: bool,

        /// Print an annotated example configuration
        #[arg(long)]
        example: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only settled lines
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { delay_ms, label, timestamps, exec } => {
            cmd::run::run(delay_ms, label, timestamps, exec).await
        }
        Commands::Config { list: _, get, set, path, create, example } => {
            if let Some(key) = get {
                cmd::config::run_get(&key).await
            } else if let Some(pair) = set {
                cmd::config::run_set(&pair[0], &pair[1]).await
            } else if path {
                cmd::config::run_path(create).await
            } else if example {
                cmd::config::run_example().await
            } else {
                cmd::config::run_list().await
            }
        }
    }
}
