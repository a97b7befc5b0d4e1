//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Boss - dependency manager for Delphi projects
///
/// Resolves boss.json dependencies against git tags, keeps them checked
/// out under modules/ and rebuilds only what changed.
#[derive(Parser, Debug)]
#[command(name = "boss")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "BOSS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project directory (defaults to current directory)
    #[arg(short = 'C', long, global = true)]
    pub project: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a boss.json in the project directory
    Init(InitArgs),

    /// Install dependencies, keeping locked versions
    #[command(alias = "i")]
    Install(InstallArgs),

    /// Re-resolve every dependency against its constraint
    #[command(alias = "up")]
    Update(BuildArgs),

    /// Remove dependencies from the project
    #[command(alias = "remove")]
    Uninstall(UninstallArgs),

    /// Print the dependency tree
    #[command(alias = "deps")]
    Dependencies,

    /// Run a script declared in boss.json
    Run(RunArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Package name (defaults to the directory name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Overwrite an existing boss.json
    #[arg(short, long)]
    pub force: bool,
}

/// Build switches shared by install and update
#[derive(Parser, Debug, Clone, Copy)]
pub struct BuildArgs {
    /// Skip compiling dependencies
    #[arg(long, conflicts_with = "force_build")]
    pub no_build: bool,

    /// Rebuild every dependency, not only changed ones
    #[arg(long)]
    pub force_build: bool,
}

/// Arguments for the install command
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Dependencies to add, e.g. horse, hashload/jhonson@^1.0 or
    /// github.com/org/repo:ssh
    pub dependencies: Vec<String>,

    #[command(flatten)]
    pub build: BuildArgs,
}

/// Arguments for the uninstall command
#[derive(Parser, Debug)]
pub struct UninstallArgs {
    /// Dependencies to remove
    #[arg(required = true)]
    pub dependencies: Vec<String>,

    #[command(flatten)]
    pub build: BuildArgs,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Script name from boss.json
    pub script: String,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}
