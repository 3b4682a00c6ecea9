use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{ConfigLoader, CONFIG_ENV};

pub mod commands;

use self::commands::{BrowseArgs, PreviewArgs, YearsArgs};

#[derive(Parser, Debug)]
#[command(
    name = "archive-toolkit",
    version,
    about = "Month-grouped, searchable, paginated blog archive"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file location (takes precedence over ARCHIVE_TOOLKIT_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mount the archive on a page snapshot and print what a visitor sees
    Preview(PreviewArgs),
    /// Explore a page snapshot interactively in the terminal
    Browse(BrowseArgs),
    /// Print the year index of a page snapshot
    Years(YearsArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }

    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let loader = ConfigLoader::discover()?;
    let config = loader.load_or_init()?;
    tracing::debug!(config = %loader.paths().config_file.display(), "configuration loaded");

    match cli.command {
        Commands::Preview(args) => commands::preview(&config, args),
        Commands::Browse(args) => commands::browse(&config, args),
        Commands::Years(args) => commands::years(&config, args),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
