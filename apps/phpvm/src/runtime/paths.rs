//! Filesystem layout of the version registry.
//!
//! ## Directory Structure
//!
//! ```text
//! ~/.phpvm/
//! ├── versions/
//! │   ├── 8.1.2/
//! │   │   ├── php-8.1.2.tar.gz
//! │   │   └── bin/php
//! │   └── 7.4.10/
//! └── active_version        # Marker naming the active version
//!
//! ~/.local/bin/php          # Activation symlink
//! ```
//!
//! A directory under `versions/` is the only proof that a version is
//! installed by phpvm.

use std::path::{Path, PathBuf};

use crate::errors::{PhpvmError, Result};

const ACTIVE_VERSION_FILE: &str = "active_version";

/// Paths owned by phpvm.
#[derive(Debug, Clone)]
pub struct PhpvmPaths {
    /// Root directory for all state (`~/.phpvm` or `PHPVM_DIR`).
    pub root: PathBuf,
    /// Directory containing one subdirectory per installed version.
    pub versions: PathBuf,
    /// Directory holding the activation symlink.
    pub local_bin: PathBuf,
}

impl PhpvmPaths {
    /// Standard layout under a home directory.
    #[must_use = "returns new paths instance without side effects"]
    pub fn from_home(home: &Path) -> Self {
        Self::with_root(home.join(".phpvm"), home.join(".local").join("bin"))
    }

    /// Layout with an explicit root and link directory.
    #[must_use = "returns new paths instance without side effects"]
    pub fn with_root(root: PathBuf, local_bin: PathBuf) -> Self {
        Self {
            versions: root.join("versions"),
            root,
            local_bin,
        }
    }

    #[must_use = "returns the path without side effects"]
    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.versions.join(version)
    }

    /// Returns the `php` binary inside a manager-managed version.
    #[must_use = "returns the path without side effects"]
    pub fn binary_path(&self, version: &str) -> PathBuf {
        self.version_dir(version).join("bin").join("php")
    }

    /// Returns where the downloaded archive for `version` is stored.
    #[must_use = "returns the path without side effects"]
    pub fn archive_path(&self, version: &str) -> PathBuf {
        self.version_dir(version)
            .join(format!("php-{version}.tar.gz"))
    }

    #[must_use = "returns the path without side effects"]
    pub fn active_version_file(&self) -> PathBuf {
        self.root.join(ACTIVE_VERSION_FILE)
    }

    /// Returns the activation symlink path.
    #[must_use = "returns the path without side effects"]
    pub fn activation_link(&self) -> PathBuf {
        self.local_bin.join("php")
    }

    /// Checks if `version` has a manager-managed directory.
    #[must_use = "returns installation status without side effects"]
    pub fn is_version_installed(&self, version: &str) -> bool {
        self.version_dir(version).is_dir()
    }

    /// Lists manager-managed versions, sorted.
    ///
    /// An absent versions directory yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the versions directory exists but cannot be read.
    pub fn list_installed_versions(&self) -> Result<Vec<String>> {
        if !self.versions.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.versions).map_err(|e| {
            PhpvmError::io(
                format!("failed to read versions directory {}", self.versions.display()),
                e,
            )
        })?;

        let mut versions = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| PhpvmError::io("failed to read directory entry", e))?;
            let path = entry.path();
            if path.is_dir()
                && let Some(name) = path.file_name()
                && let Some(name_str) = name.to_str()
            {
                versions.push(name_str.to_string());
            }
        }

        versions.sort();
        Ok(versions)
    }

    /// Returns the version named by the active-version marker.
    ///
    /// A missing or blank marker means no version is active.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the marker exists but cannot be read.
    pub fn active_version(&self) -> Result<Option<String>> {
        let marker = self.active_version_file();
        if !marker.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&marker)
            .map_err(|e| PhpvmError::io(format!("failed to read {}", marker.display()), e))?;
        let version = content.trim();
        if version.is_empty() {
            Ok(None)
        } else {
            Ok(Some(version.to_string()))
        }
    }

    /// Overwrites the active-version marker.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the root cannot be created or the marker cannot be
    /// written.
    pub fn set_active_version(&self, version: &str) -> Result<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            PhpvmError::io(format!("failed to create {}", self.root.display()), e)
        })?;
        let marker = self.active_version_file();
        std::fs::write(&marker, version)
            .map_err(|e| PhpvmError::io(format!("failed to write {}", marker.display()), e))
    }
}

/// Checks a user-supplied version identifier and returns it trimmed.
///
/// Versions become directory names that `uninstall` removes recursively, so
/// anything that could escape the versions directory is rejected.
///
/// # Errors
///
/// Returns `InvalidArgument` for empty input, path separators, `.` or `..`.
pub fn validate_version(version: &str) -> Result<String> {
    let version = version.trim();
    if version.is_empty() {
        return Err(PhpvmError::invalid_argument("version must not be empty"));
    }
    if version.contains(['/', '\\']) || version == "." || version == ".." {
        return Err(PhpvmError::invalid_argument(format!(
            "'{version}' is not a valid version"
        )));
    }
    Ok(version.to_string())
}
