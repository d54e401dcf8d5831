//! Runtime configuration.
//!
//! All filesystem locations and external endpoints the engine uses are
//! collected into [`Config`] once, at startup, and passed down explicitly.
//!
//! ## Environment Variables
//!
//! - `HOME` / `USERPROFILE`: base for `~/.phpvm` and `~/.local/bin`
//! - `PHPVM_DIR`: overrides `~/.phpvm`
//! - `PHP_BASE_URL`: archive download base
//! - `PHPVM_PLATFORM`: forces a platform identifier
//! - `PHPVM_NO_AUTO_SWITCH`: disables `.phpvmrc` auto-switching
//! - `PATH`: checked to decide whether to print a PATH advisory

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::runtime::PhpvmPaths;
use crate::runtime::distribution::DEFAULT_BASE_URL;

pub const PHPVM_DIR_ENV: &str = "PHPVM_DIR";
pub const PHP_BASE_URL_ENV: &str = "PHP_BASE_URL";
pub const PHPVM_PLATFORM_ENV: &str = "PHPVM_PLATFORM";
pub const PHPVM_NO_AUTO_SWITCH_ENV: &str = "PHPVM_NO_AUTO_SWITCH";

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub paths: PhpvmPaths,
    /// Base URL for direct-download archives.
    pub base_url: String,
    /// os-release file used to identify the Linux distribution.
    pub os_release: PathBuf,
    /// Directory where distribution packages place versioned `php` binaries.
    pub system_bin: PathBuf,
    /// Directory holding `php-<version>` links left by older releases.
    pub legacy_bin: PathBuf,
    /// Platform identifier forced instead of probing the host.
    pub platform_override: Option<String>,
    /// `PATH` value used for the advisory check.
    pub search_path: Option<OsString>,
    pub auto_switch: bool,
}

impl Config {
    /// Builds the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined or a relative
    /// `PHPVM_DIR` cannot be resolved.
    pub fn from_env() -> Result<Self> {
        let home = non_empty_var(&["HOME", "USERPROFILE"])
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .context("Cannot determine home directory. Set HOME or PHPVM_DIR.")?;

        let mut config = Self::with_home(&home);
        if let Some(root) = non_empty_var(&[PHPVM_DIR_ENV]) {
            let root = absolute_root(Path::new(&root))?;
            config.paths = PhpvmPaths::with_root(root, config.paths.local_bin);
        }
        if let Some(base) = non_empty_var(&[PHP_BASE_URL_ENV]) {
            config.base_url = base.to_string_lossy().into_owned();
        }
        config.platform_override =
            non_empty_var(&[PHPVM_PLATFORM_ENV]).map(|v| v.to_string_lossy().into_owned());
        config.search_path = std::env::var_os("PATH");
        config.auto_switch = !non_empty_var(&[PHPVM_NO_AUTO_SWITCH_ENV])
            .is_some_and(|v| is_truthy(&v.to_string_lossy()));

        Ok(config)
    }

    /// Default configuration rooted at `home`, with system locations at their
    /// usual places and nothing read from the environment.
    #[must_use]
    pub fn with_home(home: &Path) -> Self {
        Self {
            paths: PhpvmPaths::from_home(home),
            base_url: DEFAULT_BASE_URL.to_string(),
            os_release: PathBuf::from("/etc/os-release"),
            system_bin: PathBuf::from("/usr/bin"),
            legacy_bin: PathBuf::from("/usr/local/bin"),
            platform_override: None,
            search_path: None,
            auto_switch: true,
        }
    }
}

/// Anchors a manager root to the current directory.
///
/// Activation links store the binary path verbatim, so the root must not be
/// relative.
fn absolute_root(root: &Path) -> Result<PathBuf> {
    std::path::absolute(root)
        .with_context(|| format!("Cannot resolve {PHPVM_DIR_ENV}={}", root.display()))
}

fn non_empty_var(names: &[&str]) -> Option<OsString> {
    names
        .iter()
        .filter_map(|name| std::env::var_os(name))
        .find(|value| !value.is_empty())
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
