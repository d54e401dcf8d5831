//! Where a PHP version comes from on each platform.
//!
//! macOS on Intel and Linux have direct-download archives; every platform
//! except Windows can also fall back to a package manager.

use std::path::PathBuf;

use super::package_manager::PackageManager;
use super::platform::{LinuxDistro, Platform};
use crate::errors::Result;

/// Default base URL for PHP archives.
pub const DEFAULT_BASE_URL: &str = "https://www.php.net/distributions";

/// Resolves download URLs and package managers for a platform.
#[derive(Debug, Clone)]
pub struct DistributionLocator {
    base_url: String,
    os_release: PathBuf,
}

impl DistributionLocator {
    #[must_use]
    pub fn new(base_url: impl Into<String>, os_release: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            os_release: os_release.into(),
        }
    }

    /// Returns the archive URL for `version`, or `None` when the platform has
    /// no direct download.
    #[must_use]
    pub fn download_url(&self, platform: Platform, version: &str) -> Option<String> {
        let base = self.base_url.trim_end_matches('/');
        match platform {
            Platform::MacosIntel => Some(format!("{base}/php-{version}-darwin-x86_64.tar.gz")),
            Platform::Linux => Some(format!("{base}/php-{version}-linux.tar.gz")),
            Platform::MacosAppleSilicon | Platform::Windows => None,
        }
    }

    /// Returns the package manager for `platform`, or `None` on Windows.
    ///
    /// On Linux this reads os-release to pick between apt and dnf.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedDistro` for an unknown Linux distribution and `Io`
    /// if os-release cannot be read.
    pub fn package_manager(&self, platform: Platform) -> Result<Option<PackageManager>> {
        match platform {
            Platform::MacosAppleSilicon | Platform::MacosIntel => {
                Ok(Some(PackageManager::Homebrew))
            }
            Platform::Linux => Ok(Some(LinuxDistro::detect(&self.os_release)?.package_manager())),
            Platform::Windows => Ok(None),
        }
    }
}
