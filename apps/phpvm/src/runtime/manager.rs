//! The version manager facade.
//!
//! [`VersionManager`] ties the configuration, the detected platform and the
//! subprocess runner together and exposes the install and uninstall
//! workflows. Activation lives in [`super::activation`] and listing in
//! [`super::registry`], both as further `impl VersionManager` blocks.

use std::path::PathBuf;
use std::sync::Arc;

use super::distribution::DistributionLocator;
use super::package_manager::PackageManager;
use super::paths::{PhpvmPaths, validate_version};
use super::platform::Platform;
use super::runner::{CommandRunner, ShellCommand, SystemRunner, run_checked};
use super::{archive, download};
use crate::config::Config;
use crate::errors::{PhpvmError, Result};

/// How an install request was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The version directory already existed.
    AlreadyInstalled,
    /// The archive was downloaded and extracted into `dir`.
    Downloaded { dir: PathBuf },
    /// The platform package manager installed it.
    PackageManager(PackageManager),
    /// Installation is not supported on this platform.
    Unsupported(Platform),
}

/// How an uninstall request was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallOutcome {
    /// The manager-managed directory was removed.
    Removed { dir: PathBuf },
    /// The platform package manager removed it.
    PackageManager(PackageManager),
    /// Uninstalling is not supported on this platform.
    Unsupported(Platform),
}

/// Entry point for every version-management operation.
pub struct VersionManager {
    pub(crate) config: Config,
    pub(crate) platform: Platform,
    pub(crate) runner: Arc<dyn CommandRunner>,
}

impl VersionManager {
    #[must_use]
    pub fn new(config: Config, platform: Platform, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config,
            platform,
            runner,
        }
    }

    /// Builds a manager for the host, honouring the platform override.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPlatform` or `InvalidArgument` from detection.
    pub fn from_config(config: Config) -> Result<Self> {
        let platform = Platform::detect(config.platform_override.as_deref())?;
        tracing::debug!(%platform, root = %config.paths.root.display(), "version manager ready");
        Ok(Self::new(config, platform, Arc::new(SystemRunner)))
    }

    #[must_use]
    pub fn paths(&self) -> &PhpvmPaths {
        &self.config.paths
    }

    #[must_use]
    pub fn locator(&self) -> DistributionLocator {
        DistributionLocator::new(&self.config.base_url, &self.config.os_release)
    }

    /// Installs `version`.
    ///
    /// # Process
    ///
    /// 1. Short-circuit on Windows and for versions already installed
    /// 2. Download, extract and verify the archive
    /// 3. If any of that fails, remove the half-created version directory and
    ///    run the package manager install commands instead
    ///
    /// # Errors
    ///
    /// Download and extraction failures are recovered. Errors come from the
    /// package-manager path: `UnsupportedDistro`, `NotFound` when the tool
    /// is missing, or `CommandFailed`.
    pub async fn install(&self, version: &str) -> Result<InstallOutcome> {
        let version = validate_version(version)?;

        if self.platform == Platform::Windows {
            return Ok(InstallOutcome::Unsupported(self.platform));
        }
        if self.paths().is_version_installed(&version) {
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        let version_dir = self.paths().version_dir(&version);
        let dir_existed = version_dir.exists();

        match self.install_from_archive(&version).await {
            Ok(dir) => return Ok(InstallOutcome::Downloaded { dir }),
            Err(e) => {
                tracing::warn!("Direct download of PHP {version} failed: {e}");
                if !dir_existed
                    && version_dir.exists()
                    && let Err(cleanup) = std::fs::remove_dir_all(&version_dir)
                {
                    tracing::warn!("Failed to remove {}: {cleanup}", version_dir.display());
                }
            }
        }

        self.install_with_package_manager(&version)
    }

    async fn install_from_archive(&self, version: &str) -> Result<PathBuf> {
        let archive_path =
            download::acquire(&self.locator(), self.paths(), version, self.platform).await?;
        let dir = archive::extract(&archive_path, version)?;

        let binary = self.paths().binary_path(version);
        if !binary.is_file() {
            return Err(PhpvmError::extraction_failed(
                version,
                format!("archive did not contain {}", binary.display()),
            ));
        }
        let binary = binary.to_string_lossy();
        run_checked(
            self.runner.as_ref(),
            &ShellCommand::interactive(&binary, &["-v"]),
        )?;

        Ok(dir)
    }

    fn install_with_package_manager(&self, version: &str) -> Result<InstallOutcome> {
        let pm = self
            .locator()
            .package_manager(self.platform)?
            .ok_or(PhpvmError::NoDirectDownload {
                platform: self.platform,
            })?;

        self.ensure_tool(pm)?;
        tracing::info!("Installing PHP {version} with {}", pm.name());
        for command in pm.install_commands(version) {
            run_checked(self.runner.as_ref(), &command)?;
        }
        Ok(InstallOutcome::PackageManager(pm))
    }

    /// Removes `version`.
    ///
    /// The active version is never removed. A manager-managed version loses
    /// its directory; anything else is handed to the package manager.
    ///
    /// # Errors
    ///
    /// - `VersionInUse` if `version` is active; nothing is touched
    /// - `Io` if the directory cannot be removed
    /// - package-manager errors for versions phpvm does not own
    pub fn uninstall(&self, version: &str) -> Result<UninstallOutcome> {
        let version = validate_version(version)?;

        if self.paths().active_version()?.as_deref() == Some(version.as_str()) {
            return Err(PhpvmError::VersionInUse { version });
        }

        let outcome = if self.paths().is_version_installed(&version) {
            let dir = self.paths().version_dir(&version);
            std::fs::remove_dir_all(&dir).map_err(|e| {
                PhpvmError::io(format!("failed to remove {}", dir.display()), e)
            })?;
            UninstallOutcome::Removed { dir }
        } else {
            match self.locator().package_manager(self.platform)? {
                None => return Ok(UninstallOutcome::Unsupported(self.platform)),
                Some(pm) => {
                    self.ensure_tool(pm)?;
                    for command in pm.uninstall_commands(&version) {
                        run_checked(self.runner.as_ref(), &command)?;
                    }
                    UninstallOutcome::PackageManager(pm)
                }
            }
        };

        self.remove_legacy_link(&version);
        Ok(outcome)
    }

    fn remove_legacy_link(&self, version: &str) {
        let legacy = self.config.legacy_bin.join(format!("php-{version}"));
        if legacy.symlink_metadata().is_ok()
            && let Err(e) = std::fs::remove_file(&legacy)
        {
            tracing::warn!("Could not remove {}: {e}", legacy.display());
        }
    }

    fn ensure_tool(&self, pm: PackageManager) -> Result<()> {
        if self.runner.exists(pm.tool()) {
            Ok(())
        } else {
            Err(PhpvmError::not_found(pm.tool()))
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{config, install_fake_version, manager};
    use super::*;
    use crate::runtime::archive::fixtures::write_php_build;
    use crate::runtime::download::stub::{Body, serve};
    use crate::runtime::runner::fake::FakeRunner;
    use assert_fs::TempDir;

    #[tokio::test]
    async fn windows_install_is_a_notice_not_an_error() {
        let temp = TempDir::new().expect("temp dir");
        let (mgr, runner) = manager(config(temp.path()), Platform::Windows, FakeRunner::new());

        let outcome = mgr.install("8.2.0").await.expect("no error");

        assert_eq!(outcome, InstallOutcome::Unsupported(Platform::Windows));
        assert!(runner.calls().is_empty());
        assert!(!mgr.paths().versions.exists());
    }

    #[tokio::test]
    async fn installed_version_is_not_reinstalled() {
        let temp = TempDir::new().expect("temp dir");
        let (mgr, runner) = manager(config(temp.path()), Platform::Linux, FakeRunner::new());
        install_fake_version(&mgr, "8.1.2");

        assert_eq!(
            mgr.install("8.1.2").await.expect("ok"),
            InstallOutcome::AlreadyInstalled
        );
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn downloaded_archive_is_extracted_and_verified() {
        let temp = TempDir::new().expect("temp dir");
        let build = temp.path().join("build.tar.gz");
        write_php_build(&build, "8.1.2");
        let bytes: &'static [u8] = Box::leak(std::fs::read(&build).expect("read").into_boxed_slice());
        let addr = serve("/php-8.1.2-linux.tar.gz", Body::Complete(bytes)).await;

        let mut cfg = config(temp.path());
        cfg.base_url = format!("http://{addr}");
        let (mgr, runner) = manager(cfg, Platform::Linux, FakeRunner::new());

        let outcome = mgr.install("8.1.2").await.expect("install");

        assert_eq!(
            outcome,
            InstallOutcome::Downloaded {
                dir: mgr.paths().version_dir("8.1.2")
            }
        );
        let binary = mgr.paths().binary_path("8.1.2");
        assert!(binary.is_file());
        assert_eq!(runner.calls(), vec![format!("{} -v", binary.display())]);
    }

    #[tokio::test]
    async fn failed_download_falls_back_to_apt() {
        let temp = TempDir::new().expect("temp dir");
        let cfg = config(temp.path());
        std::fs::write(&cfg.os_release, "ID=ubuntu\n").expect("write");
        let (mgr, runner) = manager(cfg, Platform::Linux, FakeRunner::new());

        let outcome = mgr.install("8.2").await.expect("fallback succeeds");

        assert_eq!(outcome, InstallOutcome::PackageManager(PackageManager::Apt));
        assert_eq!(
            runner.calls(),
            vec!["sudo apt-get update", "sudo apt-get install -y php8.2"]
        );
        assert!(!mgr.paths().version_dir("8.2").exists());
    }

    #[tokio::test]
    async fn corrupt_archive_is_cleaned_up_before_fallback() {
        let addr = serve("/php-8.1.2-linux.tar.gz", Body::Complete(b"not a tarball")).await;
        let temp = TempDir::new().expect("temp dir");
        let mut cfg = config(temp.path());
        cfg.base_url = format!("http://{addr}");
        std::fs::write(&cfg.os_release, "ID=fedora\n").expect("write");
        let (mgr, runner) = manager(cfg, Platform::Linux, FakeRunner::new());

        let outcome = mgr.install("8.1.2").await.expect("fallback succeeds");

        assert_eq!(outcome, InstallOutcome::PackageManager(PackageManager::Dnf));
        assert_eq!(runner.calls(), vec!["sudo dnf install -y php"]);
        assert!(!mgr.paths().version_dir("8.1.2").exists());
        assert!(!mgr.paths().is_version_installed("8.1.2"));
    }

    #[tokio::test]
    async fn apple_silicon_goes_straight_to_homebrew() {
        let temp = TempDir::new().expect("temp dir");
        let (mgr, runner) = manager(
            config(temp.path()),
            Platform::MacosAppleSilicon,
            FakeRunner::new(),
        );

        let outcome = mgr.install("8.3").await.expect("brew install");

        assert_eq!(
            outcome,
            InstallOutcome::PackageManager(PackageManager::Homebrew)
        );
        assert_eq!(runner.calls(), vec!["brew install php@8.3"]);
    }

    #[tokio::test]
    async fn missing_homebrew_is_reported() {
        let temp = TempDir::new().expect("temp dir");
        let (mgr, runner) = manager(
            config(temp.path()),
            Platform::MacosAppleSilicon,
            FakeRunner::new().with_tools(&[]),
        );

        let err = mgr.install("8.3").await.unwrap_err();

        assert!(matches!(err, PhpvmError::NotFound { .. }), "{err:?}");
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn package_manager_failure_propagates() {
        let temp = TempDir::new().expect("temp dir");
        let cfg = config(temp.path());
        std::fs::write(&cfg.os_release, "ID=debian\n").expect("write");
        let (mgr, runner) = manager(cfg, Platform::Linux, FakeRunner::new().default_code(100));

        let err = mgr.install("7.4").await.unwrap_err();

        assert!(matches!(err, PhpvmError::CommandFailed { code: Some(100), .. }));
        assert_eq!(runner.calls(), vec!["sudo apt-get update"]);
    }

    #[test]
    fn uninstall_active_version_touches_nothing() {
        let temp = TempDir::new().expect("temp dir");
        let (mgr, runner) = manager(config(temp.path()), Platform::Linux, FakeRunner::new());
        install_fake_version(&mgr, "8.1.2");
        mgr.paths().set_active_version("8.1.2").expect("marker");

        let err = mgr.uninstall("8.1.2").unwrap_err();

        assert!(matches!(err, PhpvmError::VersionInUse { .. }));
        assert!(mgr.paths().binary_path("8.1.2").is_file());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn uninstall_other_version_keeps_marker() {
        let temp = TempDir::new().expect("temp dir");
        let cfg = config(temp.path());
        std::fs::create_dir_all(&cfg.legacy_bin).expect("mkdir");
        let legacy = cfg.legacy_bin.join("php-7.4.10");
        std::fs::write(&legacy, "").expect("write");
        let (mgr, runner) = manager(cfg, Platform::Linux, FakeRunner::new());
        install_fake_version(&mgr, "8.1.2");
        install_fake_version(&mgr, "7.4.10");
        mgr.paths().set_active_version("8.1.2").expect("marker");

        let outcome = mgr.uninstall("7.4.10").expect("uninstall");

        assert_eq!(
            outcome,
            UninstallOutcome::Removed {
                dir: mgr.paths().version_dir("7.4.10")
            }
        );
        assert!(!mgr.paths().version_dir("7.4.10").exists());
        assert!(!legacy.exists());
        assert_eq!(
            mgr.paths().active_version().expect("read").as_deref(),
            Some("8.1.2")
        );
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn uninstall_unmanaged_version_uses_package_manager() {
        let temp = TempDir::new().expect("temp dir");
        let cfg = config(temp.path());
        std::fs::write(&cfg.os_release, "ID=fedora\n").expect("write");
        let (mgr, runner) = manager(cfg, Platform::Linux, FakeRunner::new());

        let outcome = mgr.uninstall("8.0").expect("uninstall");

        assert_eq!(outcome, UninstallOutcome::PackageManager(PackageManager::Dnf));
        assert_eq!(runner.calls(), vec!["sudo dnf remove -y php8.0"]);
    }

    #[test]
    fn uninstall_rejects_path_like_versions() {
        let temp = TempDir::new().expect("temp dir");
        let (mgr, _runner) = manager(config(temp.path()), Platform::Linux, FakeRunner::new());
        std::fs::create_dir_all(&mgr.paths().versions).expect("mkdir");

        assert!(matches!(
            mgr.uninstall(".."),
            Err(PhpvmError::InvalidArgument { .. })
        ));
        assert!(mgr.paths().versions.exists());
    }
}
