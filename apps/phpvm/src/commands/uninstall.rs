//! Uninstall command for the phpvm CLI.
//!
//! ## Usage
//!
//! ```bash
//! phpvm uninstall 7.4.10
//! phpvm rm 7.4.10
//! ```

use anyhow::Result;
use clap::Args;

use crate::runtime::{UninstallOutcome, VersionManager};

/// Arguments for the uninstall command.
#[derive(Args)]
pub struct UninstallArgs {
    /// Version to uninstall (e.g., "7.4.10").
    pub version: String,
}

/// Executes the uninstall command.
///
/// # Errors
///
/// Returns an error if the version is currently active, its directory
/// cannot be removed, or the package manager fails.
pub fn execute(args: &UninstallArgs, manager: &VersionManager) -> Result<()> {
    let version = args.version.trim();

    match manager.uninstall(version)? {
        UninstallOutcome::Removed { dir } => {
            println!("PHP {version} uninstalled ({} removed).", dir.display());
        }
        UninstallOutcome::PackageManager(pm) => {
            println!("PHP {version} uninstalled with {}.", pm.name());
        }
        UninstallOutcome::Unsupported(platform) => {
            println!("Uninstalling PHP is not supported on {platform} yet.");
        }
    }

    Ok(())
}
