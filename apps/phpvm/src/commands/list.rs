//! List command for the phpvm CLI.
//!
//! ## Usage
//!
//! ```bash
//! phpvm list
//! phpvm ls --json
//! ```
//!
//! ## Output Format
//!
//! ```text
//! Installed by phpvm:
//!   7.4.10
//! * 8.1.2    (active)
//!
//! Installed by apt:
//!   ii  php8.1-cli  8.1.2
//! ```

use anyhow::{Context, Result};
use clap::Args;

use crate::runtime::{ProbeOutcome, VersionListing, VersionManager};

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Print the listing as JSON.
    #[clap(long)]
    pub json: bool,
}

/// Executes the list command.
///
/// # Errors
///
/// Returns an error if the versions directory cannot be read.
pub fn execute(args: &ListArgs, manager: &VersionManager) -> Result<()> {
    let listing = manager.list()?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&listing).context("Failed to serialize listing")?;
        println!("{json}");
    } else {
        print_listing(&listing);
    }

    Ok(())
}

fn print_listing(listing: &VersionListing) {
    if listing.manager_managed.is_empty() {
        println!("No PHP versions installed by phpvm.");
    } else {
        println!("Installed by phpvm:");
        for version in &listing.manager_managed {
            if listing.active.as_deref() == Some(version.as_str()) {
                println!("* {version}    (active)");
            } else {
                println!("  {version}");
            }
        }
    }

    for probe in &listing.package_managed {
        println!();
        match &probe.outcome {
            ProbeOutcome::Available { lines } if lines.is_empty() => {
                println!("No PHP packages installed by {}.", probe.manager.name());
            }
            ProbeOutcome::Available { lines } => {
                println!("Installed by {}:", probe.manager.name());
                for line in lines {
                    println!("  {line}");
                }
            }
            ProbeOutcome::Unavailable { reason } => {
                println!("Could not query {}: {reason}", probe.manager.name());
            }
        }
    }
}
