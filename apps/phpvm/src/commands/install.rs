//! Install command for the phpvm CLI.
//!
//! Downloads a PHP build when one is published for the platform and falls
//! back to the system package manager otherwise.
//!
//! ## Usage
//!
//! ```bash
//! phpvm install 8.1.2
//! phpvm i 7.4.10
//! ```

use anyhow::{Context, Result};
use clap::Args;

use crate::runtime::{InstallOutcome, VersionManager};

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Version to install (e.g., "8.1.2").
    pub version: String,
}

/// Executes the install command.
///
/// # Process
///
/// 1. Skip versions that are already installed
/// 2. Download and extract the archive for the platform
/// 3. Fall back to Homebrew, apt or dnf if that fails
///
/// # Errors
///
/// Returns an error if the version is invalid or the package-manager
/// fallback fails.
pub async fn execute(args: &InstallArgs, manager: &VersionManager) -> Result<()> {
    let version = args.version.trim();
    println!("Installing PHP {version}...");

    let outcome = manager
        .install(version)
        .await
        .with_context(|| format!("Failed to install PHP {version}"))?;

    match outcome {
        InstallOutcome::AlreadyInstalled => {
            println!("PHP {version} is already installed.");
        }
        InstallOutcome::Downloaded { dir } => {
            println!("PHP {version} installed to {}.", dir.display());
            println!();
            println!("Run 'phpvm use {version}' to activate it.");
        }
        InstallOutcome::PackageManager(pm) => {
            println!("PHP {version} installed with {}.", pm.name());
            println!();
            println!("Run 'phpvm use {version}' to activate it.");
        }
        InstallOutcome::Unsupported(platform) => {
            println!("Installing PHP is not supported on {platform} yet.");
        }
    }

    Ok(())
}
