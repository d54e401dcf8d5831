//! Project version pins (`.phpvmrc`).

use std::path::{Path, PathBuf};

use crate::errors::{PhpvmError, Result};

/// File name of a project pin.
pub const PIN_FILE: &str = ".phpvmrc";

/// Finds the nearest pin file in `start` or any of its ancestors, up to and
/// including the filesystem root.
#[must_use]
pub fn find_pin_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PIN_FILE))
        .find(|candidate| candidate.is_file())
}

/// Reads the pinned version, trimmed. Blank files yield `None`.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read.
pub fn read_pin(pin_file: &Path) -> Result<Option<String>> {
    let content = std::fs::read_to_string(pin_file)
        .map_err(|e| PhpvmError::io(format!("failed to read {}", pin_file.display()), e))?;
    let version = content.trim();
    Ok((!version.is_empty()).then(|| version.to_string()))
}
