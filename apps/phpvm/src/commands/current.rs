//! Current command for the phpvm CLI.
//!
//! Shows the active version and where the activation link points.

use anyhow::Result;

use crate::runtime::VersionManager;

/// Executes the current command.
///
/// # Errors
///
/// Returns an error if the active-version marker cannot be read.
pub fn execute(manager: &VersionManager) -> Result<()> {
    let paths = manager.paths();
    let Some(version) = paths.active_version()? else {
        println!("No PHP version is active.");
        println!();
        println!("Run 'phpvm use <version>' to activate one.");
        return Ok(());
    };

    let link = paths.activation_link();
    match std::fs::read_link(&link) {
        Ok(target) => println!("PHP {version} ({} -> {})", link.display(), target.display()),
        Err(_) => println!("PHP {version} ({} is missing)", link.display()),
    }

    Ok(())
}
