//! Switching to the version pinned by `.phpvmrc` before a command runs.

use std::path::{Path, PathBuf};

use super::activation::Activation;
use super::manager::VersionManager;
use super::pin::{find_pin_file, read_pin};
use crate::errors::PhpvmError;

/// What the auto-switcher did.
#[derive(Debug)]
pub enum AutoSwitchOutcome {
    /// No pin file in the directory or any ancestor.
    NoPinFile,
    /// The pin file is blank.
    EmptyPin { pin_file: PathBuf },
    /// The pinned version is already active.
    AlreadyActive { version: String },
    /// The pinned version was activated, installing it first if needed.
    Switched {
        pin_file: PathBuf,
        activation: Activation,
    },
    /// Reading, installing or activating failed. The caller carries on.
    Failed {
        pin_file: PathBuf,
        error: PhpvmError,
    },
}

/// Ensures the version pinned for `start_dir` is installed and active.
///
/// Never fails: problems are logged and returned as
/// [`AutoSwitchOutcome::Failed`].
pub async fn auto_switch(manager: &VersionManager, start_dir: &Path) -> AutoSwitchOutcome {
    let Some(pin_file) = find_pin_file(start_dir) else {
        tracing::debug!(dir = %start_dir.display(), "no .phpvmrc found");
        return AutoSwitchOutcome::NoPinFile;
    };

    let version = match read_pin(&pin_file) {
        Ok(Some(version)) => version,
        Ok(None) => {
            tracing::warn!("Ignoring empty {}", pin_file.display());
            return AutoSwitchOutcome::EmptyPin { pin_file };
        }
        Err(error) => return failed(pin_file, error),
    };

    if manager.is_active(&version) {
        tracing::debug!(%version, "pinned version already active");
        return AutoSwitchOutcome::AlreadyActive { version };
    }

    tracing::info!("Switching to PHP {version} from {}", pin_file.display());

    if !manager.paths().is_version_installed(&version)
        && let Err(error) = manager.install(&version).await
    {
        return failed(pin_file, error);
    }

    match manager.activate(&version) {
        Ok(activation) => AutoSwitchOutcome::Switched {
            pin_file,
            activation,
        },
        Err(error) => failed(pin_file, error),
    }
}

fn failed(pin_file: PathBuf, error: PhpvmError) -> AutoSwitchOutcome {
    tracing::warn!(
        "Could not switch to the version pinned in {}: {}",
        pin_file.display(),
        error.root_cause()
    );
    AutoSwitchOutcome::Failed { pin_file, error }
}
