//! Error types for the phpvm CLI.
//!
//! `PhpvmError` is the typed error returned by the version-management engine
//! in [`crate::runtime`]. Command handlers convert it into `anyhow::Error` at
//! the command boundary, where `main` reports it and exits with code 1.

use std::path::PathBuf;
use thiserror::Error;

use crate::runtime::Platform;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, PhpvmError>;

/// Consolidated error type for phpvm operations.
#[derive(Debug, Error)]
pub enum PhpvmError {
    /// The host OS is not one of the supported platforms.
    #[error("unsupported platform: {os} with architecture: {arch}")]
    UnsupportedPlatform {
        /// Raw OS name reported by the host.
        os: String,
        /// Raw CPU architecture reported by the host.
        arch: String,
    },

    /// The Linux distribution has no known package manager mapping.
    #[error("unsupported Linux distribution: {distro}")]
    UnsupportedDistro {
        /// The `ID=` value read from os-release (empty if missing).
        distro: String,
    },

    /// There is no direct-download archive for this platform.
    #[error("no download URL available for platform: {platform}; use a package manager")]
    NoDirectDownload {
        /// The platform that has no archive.
        platform: Platform,
    },

    /// The existence probe for a download URL did not succeed.
    #[error("PHP binary for platform \"{platform}\" and version \"{version}\" is not available at {url}")]
    BinaryNotAvailable {
        /// The probed URL.
        url: String,
        /// Platform the archive was requested for.
        platform: Platform,
        /// Requested version.
        version: String,
    },

    /// Transfer failed after the existence probe succeeded.
    #[error("failed to download {url}: {message}")]
    Download {
        /// The URL being downloaded.
        url: String,
        /// Description of the failure.
        message: String,
        /// Underlying HTTP error, if any.
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Unpacking an archive failed.
    #[error("error extracting PHP {version}: {message}")]
    ExtractionFailed {
        /// Version whose archive was being extracted.
        version: String,
        /// Description of the extraction failure.
        message: String,
    },

    /// The binary for a version could not be found on disk.
    #[error("PHP {version} is not installed. Install with: {hint}")]
    VersionNotInstalled {
        /// The requested version.
        version: String,
        /// Platform-specific install instruction.
        hint: String,
    },

    /// Activating a version failed at some step.
    #[error("failed to switch to PHP {version}")]
    ActivationFailed {
        /// The version being activated.
        version: String,
        /// The step failure.
        #[source]
        source: Box<PhpvmError>,
    },

    /// Attempt to uninstall the active version.
    #[error("PHP {version} is currently in use. Please switch to another version before uninstalling")]
    VersionInUse {
        /// The active version.
        version: String,
    },

    /// A caller-supplied argument was rejected.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong with the argument.
        message: String,
    },

    /// A required file or directory does not exist.
    #[error("not found: {}", .path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// An external command could not be spawned or exited unsuccessfully.
    #[error("command `{command}` failed{}", .code.map(|c| format!(" with exit code {c}")).unwrap_or_default())]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// Exit code, if the process ran and exited normally.
        code: Option<i32>,
    },

    /// Error reading or writing files.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O operation that failed.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl PhpvmError {
    #[must_use]
    pub fn unsupported_platform(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            os: os.into(),
            arch: arch.into(),
        }
    }

    #[must_use]
    pub fn unsupported_distro(distro: impl Into<String>) -> Self {
        Self::UnsupportedDistro {
            distro: distro.into(),
        }
    }

    #[must_use]
    pub fn download(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Download {
            url: url.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    #[must_use]
    pub fn download_status(url: impl Into<String>, status: reqwest::StatusCode) -> Self {
        Self::Download {
            url: url.into(),
            message: format!("HTTP error {status}"),
            source: None,
        }
    }

    #[must_use]
    pub fn extraction_failed(version: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            version: version.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn version_not_installed(version: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::VersionNotInstalled {
            version: version.into(),
            hint: hint.into(),
        }
    }

    /// Wraps a step failure as `ActivationFailed`, leaving an existing
    /// `ActivationFailed` untouched.
    #[must_use]
    pub fn activation_failed(version: impl Into<String>, cause: PhpvmError) -> Self {
        match cause {
            Self::ActivationFailed { .. } => cause,
            other => Self::ActivationFailed {
                version: version.into(),
                source: Box::new(other),
            },
        }
    }

    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    #[must_use]
    pub fn command_failed(command: impl Into<String>, code: Option<i32>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            code,
        }
    }

    #[must_use]
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Returns the innermost step error of an `ActivationFailed`, or `self`.
    #[must_use]
    pub fn root_cause(&self) -> &PhpvmError {
        match self {
            Self::ActivationFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_platform_names_both_raw_values() {
        let err = PhpvmError::unsupported_platform("sunos", "sparc");
        assert_eq!(
            err.to_string(),
            "unsupported platform: sunos with architecture: sparc"
        );
    }

    #[test]
    fn binary_not_available_names_url() {
        let err = PhpvmError::BinaryNotAvailable {
            url: "https://example.com/php-1.0-linux.tar.gz".to_string(),
            platform: Platform::Linux,
            version: "1.0".to_string(),
        };
        assert!(
            err.to_string()
                .contains("https://example.com/php-1.0-linux.tar.gz")
        );
    }

    #[test]
    fn version_not_installed_includes_hint() {
        let err = PhpvmError::version_not_installed("7.4", "sudo apt-get install php7.4");
        assert_eq!(
            err.to_string(),
            "PHP 7.4 is not installed. Install with: sudo apt-get install php7.4"
        );
    }

    #[test]
    fn activation_failed_keeps_cause_as_source() {
        let err = PhpvmError::activation_failed(
            "8.1.2",
            PhpvmError::not_found(PathBuf::from("/nope/php")),
        );
        assert_eq!(err.to_string(), "failed to switch to PHP 8.1.2");
        let source = std::error::Error::source(&err).expect("has source");
        assert_eq!(source.to_string(), "not found: /nope/php");
        assert!(matches!(err.root_cause(), PhpvmError::NotFound { .. }));
    }

    #[test]
    fn activation_failed_is_not_nested_twice() {
        let inner = PhpvmError::activation_failed("8.1.2", PhpvmError::invalid_argument("x"));
        let outer = PhpvmError::activation_failed("8.1.2", inner);
        let PhpvmError::ActivationFailed { source, .. } = outer else {
            panic!("Expected ActivationFailed");
        };
        assert!(matches!(*source, PhpvmError::InvalidArgument { .. }));
    }

    #[test]
    fn command_failed_displays_exit_code_when_known() {
        let err = PhpvmError::command_failed("brew link php@8.2", Some(1));
        assert_eq!(
            err.to_string(),
            "command `brew link php@8.2` failed with exit code 1"
        );

        let err = PhpvmError::command_failed("dnf list installed", None);
        assert_eq!(err.to_string(), "command `dnf list installed` failed");
    }

    #[test]
    fn version_in_use_mentions_switching() {
        let err = PhpvmError::VersionInUse {
            version: "7.4.10".to_string(),
        };
        assert!(err.to_string().contains("currently in use"));
    }
}
