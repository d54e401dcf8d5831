#![warn(clippy::pedantic)]

//! # phpvm
//!
//! A version manager for PHP. It installs versions side by side under
//! `~/.phpvm/versions`, switches between them by repointing
//! `~/.local/bin/php`, and follows `.phpvmrc` pins in project directories.
//!
//! ## Subcommands
//!
//! - `install` - Install a version (download, or package-manager fallback)
//! - `uninstall` - Remove a version
//! - `list` - List installed versions
//! - `use` - Activate a version
//! - `current` - Show the active version
//!
//! ## Examples
//!
//! ```bash
//! phpvm install 8.1.2
//! phpvm use 8.1.2
//! echo 7.4.10 > .phpvmrc   # auto-switch on the next phpvm invocation here
//! ```

mod commands;
mod config;
mod errors;
mod runtime;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{current, install, list, uninstall, use_cmd};
use tracing_subscriber::EnvFilter;

use config::Config;
use runtime::{AutoSwitchOutcome, VersionManager, auto_switch};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "PHPVM_LOG";

/// PHP version manager.
#[derive(Parser)]
#[command(
    name = "phpvm",
    author,
    version,
    about = "Install and switch between PHP versions",
    after_help = "\
ENVIRONMENT VARIABLES:
    PHPVM_DIR               State directory (default: ~/.phpvm)
    PHP_BASE_URL            Archive download base (default: https://www.php.net/distributions)
    PHPVM_PLATFORM          Force a platform: macos-apple-silicon, macos-intel, linux, windows
    PHPVM_NO_AUTO_SWITCH    Set to 1 to ignore .phpvmrc files
    PHPVM_LOG               Log filter (default: warn)"
)]
pub struct Cli {
    /// Do not switch to the version pinned in `.phpvmrc` before running.
    #[clap(long = "no-auto-switch", global = true, action = clap::ArgAction::SetTrue)]
    pub no_auto_switch: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the phpvm CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Install a PHP version.
    ///
    /// Downloads a prebuilt archive when one exists for the platform and
    /// falls back to Homebrew, apt or dnf otherwise.
    #[command(visible_alias = "i")]
    Install(install::InstallArgs),

    /// Uninstall a PHP version.
    ///
    /// The active version cannot be uninstalled.
    #[command(visible_alias = "rm")]
    Uninstall(uninstall::UninstallArgs),

    /// List installed PHP versions.
    #[command(visible_alias = "ls")]
    List(list::ListArgs),

    /// Switch to a PHP version.
    #[command(visible_alias = "switch")]
    Use(use_cmd::UseArgs),

    /// Show the active PHP version.
    Current,
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints an error and returns the exit code.
fn handle_error(e: &anyhow::Error) -> i32 {
    eprintln!("Error: {e:?}");
    1
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    let auto_switch_enabled = config.auto_switch && !cli.no_auto_switch;
    let manager = VersionManager::from_config(config)?;

    if auto_switch_enabled {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        match auto_switch(&manager, &cwd).await {
            AutoSwitchOutcome::Switched {
                pin_file,
                activation,
            } => println!(
                "Switched to PHP {} ({})",
                activation.version,
                pin_file.display()
            ),
            AutoSwitchOutcome::AlreadyActive { version } => {
                tracing::debug!(%version, "pinned version already active");
            }
            AutoSwitchOutcome::EmptyPin { pin_file } => {
                tracing::debug!(pin = %pin_file.display(), "pin file is empty");
            }
            AutoSwitchOutcome::Failed { pin_file, error } => {
                tracing::debug!(pin = %pin_file.display(), error = ?error, "auto-switch failed");
            }
            AutoSwitchOutcome::NoPinFile => {}
        }
    }

    match cli.command {
        Commands::Install(args) => install::execute(&args, &manager).await,
        Commands::Uninstall(args) => uninstall::execute(&args, &manager),
        Commands::List(args) => list::execute(&args, &manager),
        Commands::Use(args) => use_cmd::execute(&args, &manager),
        Commands::Current => current::execute(&manager),
    }
}
