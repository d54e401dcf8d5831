//! Use command for the phpvm CLI.
//!
//! Points `~/.local/bin/php` at the requested version.
//!
//! ## Usage
//!
//! ```bash
//! phpvm use 8.1.2
//! phpvm switch 7.4
//! ```

use anyhow::Result;
use clap::Args;

use crate::runtime::{Activation, VersionManager};

/// Arguments for the use command.
#[derive(Args)]
pub struct UseArgs {
    /// Version to activate (e.g., "8.1.2").
    pub version: String,
}

/// Executes the use command.
///
/// # Errors
///
/// Returns an error if the version cannot be found or the activation link
/// cannot be updated.
pub fn execute(args: &UseArgs, manager: &VersionManager) -> Result<()> {
    let activation = manager.activate(&args.version)?;
    report(&activation);
    Ok(())
}

/// Prints the result of an activation.
fn report(activation: &Activation) {
    if activation.already_active {
        println!("Already using PHP {}.", activation.version);
    } else {
        println!(
            "Now using PHP {} ({}).",
            activation.version,
            activation.binary.display()
        );
    }

    if activation.path_advisory {
        let dir = activation
            .link
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!();
        println!("Note: {dir} is not in your PATH. Add it to use the selected PHP:");
        println!("    export PATH=\"{dir}:$PATH\"");
    }
}
