//! System package managers that can provide PHP.
//!
//! Each manager knows the command sequences for installing and removing a
//! PHP version, the command that lists what it has installed, and the hint
//! shown to users when a version is missing.

use serde::Serialize;

use super::runner::ShellCommand;

/// A package manager phpvm can delegate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Homebrew,
    Apt,
    Dnf,
}

impl PackageManager {
    /// Human-readable name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Homebrew => "Homebrew",
            Self::Apt => "apt",
            Self::Dnf => "dnf",
        }
    }

    /// The executable that must be on `PATH` for install/uninstall to work.
    #[must_use]
    pub fn tool(self) -> &'static str {
        match self {
            Self::Homebrew => "brew",
            Self::Apt => "apt-get",
            Self::Dnf => "dnf",
        }
    }

    /// Commands that install `version`, run in order.
    ///
    /// dnf installs the distribution's default `php` package; Fedora does
    /// not publish versioned package names.
    #[must_use]
    pub fn install_commands(self, version: &str) -> Vec<ShellCommand> {
        match self {
            Self::Homebrew => vec![ShellCommand::interactive(
                "brew",
                &["install", &format!("php@{version}")],
            )],
            Self::Apt => vec![
                ShellCommand::interactive("sudo", &["apt-get", "update"]),
                ShellCommand::interactive(
                    "sudo",
                    &["apt-get", "install", "-y", &format!("php{version}")],
                ),
            ],
            Self::Dnf => vec![ShellCommand::interactive(
                "sudo",
                &["dnf", "install", "-y", "php"],
            )],
        }
    }

    /// Commands that remove `version`, run in order.
    #[must_use]
    pub fn uninstall_commands(self, version: &str) -> Vec<ShellCommand> {
        match self {
            Self::Homebrew => vec![ShellCommand::interactive(
                "brew",
                &["uninstall", &format!("php@{version}")],
            )],
            Self::Apt => vec![ShellCommand::interactive(
                "sudo",
                &["apt-get", "remove", "-y", &format!("php{version}")],
            )],
            Self::Dnf => vec![ShellCommand::interactive(
                "sudo",
                &["dnf", "remove", "-y", &format!("php{version}")],
            )],
        }
    }

    /// Captured command that lists installed packages.
    #[must_use]
    pub fn probe_command(self) -> ShellCommand {
        match self {
            Self::Homebrew => ShellCommand::captured("brew", &["list", "--versions"]),
            Self::Apt => ShellCommand::captured("dpkg", &["-l"]),
            Self::Dnf => ShellCommand::captured("dnf", &["list", "installed"]),
        }
    }

    /// Keeps the probe output lines that mention PHP.
    #[must_use]
    pub fn filter_probe_output(stdout: &str) -> Vec<String> {
        stdout
            .lines()
            .filter(|line| line.contains("php"))
            .map(|line| line.trim_end().to_string())
            .collect()
    }

    /// Install instruction shown when `version` is missing.
    #[must_use]
    pub fn install_hint(self, version: &str) -> String {
        match self {
            Self::Homebrew => format!("brew install php@{version}"),
            Self::Apt => format!("sudo apt-get install php{version}"),
            Self::Dnf => format!("sudo dnf install php{version}"),
        }
    }
}
