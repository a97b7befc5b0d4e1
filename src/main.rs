//! Boss - Delphi dependency manager
//!
//! CLI entry point that dispatches to subcommands.

use boss::cli::{commands, Cli, Commands};
use boss::config::{Config, ConfigManager};
use boss::error::{BossError, BossResult};
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> BossResult<()> {
    let cli = Cli::parse();

    let config_manager = ConfigManager::new(cli.config.clone());
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config);
    debug!("Using config {}", config_manager.path().display());

    let project_dir = match cli.project {
        Some(ref dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| BossError::io("getting current directory", e))?,
    };

    match cli.command {
        Commands::Init(args) => commands::init(args, &project_dir).await,
        Commands::Install(args) => commands::install(args, &config, &project_dir).await,
        Commands::Update(args) => commands::update(args, &config, &project_dir).await,
        Commands::Uninstall(args) => commands::uninstall(args, &config, &project_dir).await,
        Commands::Dependencies => commands::dependencies(&project_dir).await,
        Commands::Run(args) => commands::run(args, &project_dir).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("boss=warn"),
        1 => EnvFilter::new("boss=info"),
        _ => EnvFilter::new("boss=debug"),
    };

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .init();
    }
}
