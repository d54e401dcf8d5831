//! Version activation.
//!
//! Activating a version resolves its `php` binary, points the single
//! activation symlink (`~/.local/bin/php`) at it and records the version in
//! the active-version marker.
//!
//! The link is staged under a temporary name in the same directory and
//! renamed over the old one, and the marker is written only after that
//! rename. A crash can leave the marker stale but never ahead of the link.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use super::manager::VersionManager;
use super::package_manager::PackageManager;
use super::paths::validate_version;
use super::platform::{LinuxDistro, Platform};
use super::runner::{ShellCommand, run_checked};
use crate::errors::{PhpvmError, Result};

/// What `activate` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub version: String,
    /// The binary the link now points at.
    pub binary: PathBuf,
    /// The activation symlink.
    pub link: PathBuf,
    /// The link already pointed at `binary` and was left alone.
    pub already_active: bool,
    /// The link directory is missing from `PATH`.
    pub path_advisory: bool,
}

impl VersionManager {
    /// Makes `version` the active PHP.
    ///
    /// # Process
    ///
    /// 1. Resolve the binary: the manager-managed tree first, then the
    ///    platform's package-manager location
    /// 2. Repoint the activation symlink unless it already targets the binary
    /// 3. Write the active-version marker
    ///
    /// # Errors
    ///
    /// Every failure is wrapped in `ActivationFailed`; the cause is typically
    /// `VersionNotInstalled` carrying an install hint.
    pub fn activate(&self, version: &str) -> Result<Activation> {
        self.activate_steps(version)
            .map_err(|e| PhpvmError::activation_failed(version.trim(), e))
    }

    fn activate_steps(&self, version: &str) -> Result<Activation> {
        let version = validate_version(version)?;
        let binary = self.resolve_binary(&version)?;
        let link = self.paths().activation_link();

        let already_active = link_points_to(&link, &binary);
        if already_active {
            tracing::debug!(link = %link.display(), "activation link already current");
        } else {
            replace_link(&binary, &link)?;
        }
        self.paths().set_active_version(&version)?;

        let path_advisory =
            !is_dir_in_path(&self.paths().local_bin, self.config.search_path.as_deref());

        Ok(Activation {
            version,
            binary,
            link,
            already_active,
            path_advisory,
        })
    }

    /// Returns whether `version` is recorded as active and the activation
    /// link points at that version's binary.
    #[must_use]
    pub fn is_active(&self, version: &str) -> bool {
        let Ok(Some(active)) = self.paths().active_version() else {
            return false;
        };
        if active != version {
            return false;
        }
        let Ok(target) = std::fs::read_link(self.paths().activation_link()) else {
            return false;
        };
        if self.paths().is_version_installed(version) {
            target == self.paths().binary_path(version)
        } else {
            target.is_file() && self.is_package_binary(&target, version)
        }
    }

    /// Whether `target` is where the platform's package manager places the
    /// binary for `version`.
    fn is_package_binary(&self, target: &Path, version: &str) -> bool {
        match self.platform {
            Platform::Linux => target == self.config.system_bin.join(format!("php{version}")),
            Platform::MacosAppleSilicon | Platform::MacosIntel => {
                let formula = format!("php@{version}");
                target
                    .components()
                    .any(|c| c.as_os_str() == formula.as_str())
            }
            Platform::Windows => false,
        }
    }

    fn resolve_binary(&self, version: &str) -> Result<PathBuf> {
        if self.paths().is_version_installed(version) {
            let binary = self.paths().binary_path(version);
            return if binary.is_file() {
                Ok(binary)
            } else {
                Err(PhpvmError::not_found(binary))
            };
        }

        match self.platform {
            Platform::MacosAppleSilicon | Platform::MacosIntel => self.resolve_homebrew(version),
            Platform::Linux => self.resolve_distro_package(version),
            Platform::Windows => Err(PhpvmError::version_not_installed(
                version,
                format!(
                    "unpack a PHP {version} build into {}",
                    self.paths().version_dir(version).display()
                ),
            )),
        }
    }

    fn resolve_homebrew(&self, version: &str) -> Result<PathBuf> {
        let pm = PackageManager::Homebrew;
        let prefix = run_checked(
            self.runner.as_ref(),
            &ShellCommand::captured("brew", &["--prefix"]),
        )?;
        let binary = PathBuf::from(prefix.stdout.trim())
            .join("opt")
            .join(format!("php@{version}"))
            .join("bin")
            .join("php");

        let unlink = ShellCommand::interactive("brew", &["unlink", "php"]);
        match self.runner.run(&unlink) {
            Ok(output) if output.success() => {}
            Ok(_) => tracing::warn!("`{unlink}` failed; continuing"),
            Err(e) => tracing::warn!("`{unlink}` could not run: {e}"),
        }

        let formula = format!("php@{version}");
        let link = ShellCommand::interactive("brew", &["link", &formula]);
        let link_result = self.runner.run(&link);

        if !binary.is_file() {
            return Err(PhpvmError::version_not_installed(
                version,
                pm.install_hint(version),
            ));
        }
        match link_result {
            Ok(output) if output.success() => Ok(binary),
            Ok(output) => Err(PhpvmError::command_failed(link.to_string(), output.code)),
            Err(_) => Err(PhpvmError::command_failed(link.to_string(), None)),
        }
    }

    fn resolve_distro_package(&self, version: &str) -> Result<PathBuf> {
        let pm = LinuxDistro::detect(&self.config.os_release)?.package_manager();
        let binary = self.config.system_bin.join(format!("php{version}"));
        if binary.is_file() {
            Ok(binary)
        } else {
            Err(PhpvmError::version_not_installed(
                version,
                pm.install_hint(version),
            ))
        }
    }
}

fn link_points_to(link: &Path, target: &Path) -> bool {
    std::fs::read_link(link).is_ok_and(|dest| dest == target)
}

/// Points `link` at `target` by staging a new link and renaming it over the
/// old one.
fn replace_link(target: &Path, link: &Path) -> Result<()> {
    let dir = link
        .parent()
        .ok_or_else(|| PhpvmError::invalid_argument("activation link has no parent"))?;
    std::fs::create_dir_all(dir)
        .map_err(|e| PhpvmError::io(format!("failed to create {}", dir.display()), e))?;

    if let Ok(meta) = link.symlink_metadata()
        && meta.is_dir()
    {
        return Err(PhpvmError::invalid_argument(format!(
            "{} is a directory",
            link.display()
        )));
    }

    let staged = dir.join(format!(".php.{}.tmp", std::process::id()));
    if staged.symlink_metadata().is_ok() {
        let _ = std::fs::remove_file(&staged);
    }
    create_link(target, &staged)?;

    std::fs::rename(&staged, link).map_err(|e| {
        let _ = std::fs::remove_file(&staged);
        PhpvmError::io(format!("failed to replace {}", link.display()), e)
    })
}

fn create_link(source: &Path, target: &Path) -> Result<()> {
    #[cfg(unix)]
    let created = std::os::unix::fs::symlink(source, target);

    #[cfg(windows)]
    let created = std::os::windows::fs::symlink_file(source, target)
        .or_else(|_| std::fs::hard_link(source, target))
        .or_else(|_| std::fs::copy(source, target).map(|_| ()));

    created.map_err(|e| {
        PhpvmError::io(
            format!(
                "failed to link {} to {}",
                target.display(),
                source.display()
            ),
            e,
        )
    })
}

/// Returns whether `dir` is one of the entries of `path_var`.
#[must_use]
pub fn is_dir_in_path(dir: &Path, path_var: Option<&OsStr>) -> bool {
    path_var.is_some_and(|paths| std::env::split_paths(paths).any(|entry| entry == dir))
}
