//! Platform detection for phpvm.
//!
//! Maps the host OS and CPU architecture onto the closed set of platforms
//! phpvm knows how to serve, and reads the Linux distribution family from
//! os-release so the right package manager can be chosen.
//!
//! ## Supported Platforms
//!
//! - macOS on Apple Silicon (`macos-apple-silicon`)
//! - macOS on Intel (`macos-intel`)
//! - Linux, any architecture (`linux`)
//! - Windows (`windows`, listing only)

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use super::package_manager::PackageManager;
use crate::errors::{PhpvmError, Result};

/// A platform phpvm can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    /// macOS on ARM64.
    MacosAppleSilicon,
    /// macOS on any non-ARM64 architecture.
    MacosIntel,
    /// Linux on any architecture.
    Linux,
    /// Windows on any architecture.
    Windows,
}

impl Platform {
    /// Every platform, in the order used for help output.
    pub const ALL: [Platform; 4] = [
        Self::MacosAppleSilicon,
        Self::MacosIntel,
        Self::Linux,
        Self::Windows,
    ];

    /// Detects the platform of the running host.
    ///
    /// When `override_id` is set it is parsed as a platform identifier and
    /// returned instead of probing the host.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an unknown override and
    /// `UnsupportedPlatform` when the host OS is not recognized.
    pub fn detect(override_id: Option<&str>) -> Result<Self> {
        if let Some(id) = override_id {
            return id.parse();
        }
        Self::from_host(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Maps raw OS and architecture names onto a platform.
    ///
    /// Accepts both the Node-style names (`darwin`, `arm64`, `win32`) and the
    /// names Rust reports (`macos`, `aarch64`, `windows`).
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPlatform` carrying both raw values when the OS is
    /// not one of the supported ones.
    pub fn from_host(os: &str, arch: &str) -> Result<Self> {
        match os {
            "darwin" | "macos" => {
                if matches!(arch, "arm64" | "aarch64") {
                    Ok(Self::MacosAppleSilicon)
                } else {
                    Ok(Self::MacosIntel)
                }
            }
            "linux" => Ok(Self::Linux),
            "win32" | "windows" => Ok(Self::Windows),
            _ => Err(PhpvmError::unsupported_platform(os, arch)),
        }
    }

    /// Returns the platform identifier.
    #[must_use = "returns the platform string without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MacosAppleSilicon => "macos-apple-silicon",
            Self::MacosIntel => "macos-intel",
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = PhpvmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| {
                let accepted: Vec<&str> = Self::ALL.iter().map(|p| p.as_str()).collect();
                PhpvmError::invalid_argument(format!(
                    "unknown platform '{s}', expected one of: {}",
                    accepted.join(", ")
                ))
            })
    }
}

/// Linux distribution family, as named by the `ID=` line of os-release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinuxDistro {
    Ubuntu,
    Debian,
    Fedora,
}

impl LinuxDistro {
    /// Reads and parses an os-release file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `UnsupportedDistro` if its
    /// `ID=` value is missing or unknown.
    pub fn detect(os_release: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(os_release).map_err(|e| {
            PhpvmError::io(format!("failed to read {}", os_release.display()), e)
        })?;
        Self::from_os_release(&content)
    }

    /// Parses the `ID=` field out of os-release content.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedDistro` with the raw id (empty if absent).
    pub fn from_os_release(content: &str) -> Result<Self> {
        let id = content
            .lines()
            .find_map(|line| line.trim().strip_prefix("ID="))
            .map(|value| value.trim().trim_matches(|c| c == '"' || c == '\''))
            .unwrap_or_default();

        match id {
            "ubuntu" => Ok(Self::Ubuntu),
            "debian" => Ok(Self::Debian),
            "fedora" => Ok(Self::Fedora),
            other => Err(PhpvmError::unsupported_distro(other)),
        }
    }

    /// Returns the package manager that ships PHP on this distribution.
    #[must_use]
    pub fn package_manager(self) -> PackageManager {
        match self {
            Self::Ubuntu | Self::Debian => PackageManager::Apt,
            Self::Fedora => PackageManager::Dnf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_pairs_map_to_documented_ids() {
        let cases = [
            ("darwin", "arm64", Platform::MacosAppleSilicon),
            ("macos", "aarch64", Platform::MacosAppleSilicon),
            ("darwin", "x64", Platform::MacosIntel),
            ("macos", "x86_64", Platform::MacosIntel),
            ("linux", "x64", Platform::Linux),
            ("linux", "aarch64", Platform::Linux),
            ("win32", "x64", Platform::Windows),
            ("windows", "x86_64", Platform::Windows),
        ];
        for (os, arch, expected) in cases {
            assert_eq!(
                Platform::from_host(os, arch).expect("supported"),
                expected,
                "{os}/{arch}"
            );
        }
    }

    #[test]
    fn unsupported_os_reports_raw_values() {
        let err = Platform::from_host("freebsd", "x86_64").unwrap_err();
        match err {
            PhpvmError::UnsupportedPlatform { os, arch } => {
                assert_eq!(os, "freebsd");
                assert_eq!(arch, "x86_64");
            }
            other => panic!("Expected UnsupportedPlatform, got {other:?}"),
        }
    }

    #[test]
    fn override_wins_over_host_probe() {
        assert_eq!(
            Platform::detect(Some("macos-intel")).expect("valid override"),
            Platform::MacosIntel
        );
    }

    #[test]
    fn unknown_override_is_invalid_argument() {
        let err = Platform::detect(Some("solaris")).unwrap_err();
        assert!(matches!(err, PhpvmError::InvalidArgument { .. }));
        assert!(err.to_string().contains("macos-apple-silicon"));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for platform in Platform::ALL {
            let parsed: Platform = platform.to_string().parse().expect("round trip");
            assert_eq!(parsed, platform);
        }
    }

    #[test]
    fn os_release_id_is_parsed_with_quotes() {
        let content = "NAME=\"Ubuntu\"\nVERSION_ID=\"22.04\"\nID=ubuntu\nID_LIKE=debian\n";
        assert_eq!(
            LinuxDistro::from_os_release(content).expect("ubuntu"),
            LinuxDistro::Ubuntu
        );

        let content = "NAME=\"Fedora Linux\"\nID=\"fedora\"\n";
        assert_eq!(
            LinuxDistro::from_os_release(content).expect("fedora"),
            LinuxDistro::Fedora
        );
    }

    #[test]
    fn id_like_does_not_count_as_id() {
        let content = "ID_LIKE=debian\nID=arch\n";
        let err = LinuxDistro::from_os_release(content).unwrap_err();
        assert!(matches!(
            err,
            PhpvmError::UnsupportedDistro { ref distro } if distro == "arch"
        ));
    }

    #[test]
    fn missing_id_is_unsupported_with_empty_name() {
        let err = LinuxDistro::from_os_release("NAME=Something\n").unwrap_err();
        assert!(matches!(
            err,
            PhpvmError::UnsupportedDistro { ref distro } if distro.is_empty()
        ));
    }

    #[test]
    fn distro_families_map_to_package_managers() {
        assert_eq!(LinuxDistro::Ubuntu.package_manager(), PackageManager::Apt);
        assert_eq!(LinuxDistro::Debian.package_manager(), PackageManager::Apt);
        assert_eq!(LinuxDistro::Fedora.package_manager(), PackageManager::Dnf);
    }
}
