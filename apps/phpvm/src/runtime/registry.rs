//! Listing of installed versions.
//!
//! Manager-managed versions come from the versions directory. Versions owned
//! by a package manager are reported as the raw lines its listing command
//! prints; a manager that cannot be queried is reported, not fatal.

use serde::Serialize;

use super::manager::VersionManager;
use super::package_manager::PackageManager;
use super::platform::Platform;
use crate::errors::Result;

/// Everything `list` shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionListing {
    /// Versions under `versions/`, sorted.
    pub manager_managed: Vec<String>,
    /// The version named by the active-version marker.
    pub active: Option<String>,
    pub package_managed: Vec<PackageProbe>,
}

/// Result of querying one package manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageProbe {
    pub manager: PackageManager,
    pub outcome: ProbeOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProbeOutcome {
    /// Lines of the listing that mention PHP.
    Available { lines: Vec<String> },
    /// The manager could not be queried.
    Unavailable { reason: String },
}

impl VersionManager {
    /// Lists manager-managed versions and probes the platform's package
    /// managers.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the versions directory or the marker exists but
    /// cannot be read. Probe failures are reported in the listing.
    pub fn list(&self) -> Result<VersionListing> {
        let manager_managed = self.paths().list_installed_versions()?;
        let active = self.paths().active_version()?;

        let package_managed = probed_managers(self.platform)
            .iter()
            .map(|&manager| PackageProbe {
                manager,
                outcome: self.probe(manager),
            })
            .collect();

        Ok(VersionListing {
            manager_managed,
            active,
            package_managed,
        })
    }

    fn probe(&self, manager: PackageManager) -> ProbeOutcome {
        let command = manager.probe_command();
        if !self.runner.exists(&command.program) {
            return ProbeOutcome::Unavailable {
                reason: format!("{} not found", command.program),
            };
        }

        match self.runner.run(&command) {
            Ok(output) if output.success() => ProbeOutcome::Available {
                lines: PackageManager::filter_probe_output(&output.stdout),
            },
            Ok(output) => {
                let reason = match output.code {
                    Some(code) => format!("`{command}` exited with code {code}"),
                    None => format!("`{command}` was terminated"),
                };
                tracing::warn!("{} probe failed: {reason}", manager.name());
                ProbeOutcome::Unavailable { reason }
            }
            Err(e) => {
                tracing::warn!("{} probe failed: {e}", manager.name());
                ProbeOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn probed_managers(platform: Platform) -> &'static [PackageManager] {
    match platform {
        Platform::MacosAppleSilicon | Platform::MacosIntel => &[PackageManager::Homebrew],
        Platform::Linux => &[PackageManager::Apt, PackageManager::Dnf],
        Platform::Windows => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::manager::testing::{config, install_fake_version, manager};
    use crate::runtime::runner::fake::FakeRunner;
    use assert_fs::TempDir;

    #[test]
    fn absent_root_lists_nothing() {
        let temp = TempDir::new().expect("temp dir");
        let (mgr, runner) = manager(config(temp.path()), Platform::Windows, FakeRunner::new());

        let listing = mgr.list().expect("list");

        assert!(listing.manager_managed.is_empty());
        assert_eq!(listing.active, None);
        assert!(listing.package_managed.is_empty());
        assert!(runner.calls().is_empty());
        assert!(!mgr.paths().root.exists());
    }

    #[test]
    fn linux_probes_apt_and_dnf_independently() {
        let temp = TempDir::new().expect("temp dir");
        let runner = FakeRunner::new()
            .with_tools(&["dpkg"])
            .respond("dpkg -l", 0, "ii  php8.1-cli  8.1.2\nii  vim  9.0\n");
        let (mgr, runner) = manager(config(temp.path()), Platform::Linux, runner);
        install_fake_version(&mgr, "8.2.0");
        install_fake_version(&mgr, "7.4.10");
        mgr.paths().set_active_version("8.2.0").expect("marker");

        let listing = mgr.list().expect("list");

        assert_eq!(listing.manager_managed, vec!["7.4.10", "8.2.0"]);
        assert_eq!(listing.active.as_deref(), Some("8.2.0"));
        assert_eq!(
            listing.package_managed,
            vec![
                PackageProbe {
                    manager: PackageManager::Apt,
                    outcome: ProbeOutcome::Available {
                        lines: vec!["ii  php8.1-cli  8.1.2".to_string()]
                    },
                },
                PackageProbe {
                    manager: PackageManager::Dnf,
                    outcome: ProbeOutcome::Unavailable {
                        reason: "dnf not found".to_string()
                    },
                },
            ]
        );
        assert_eq!(runner.calls(), vec!["dpkg -l"]);
    }

    #[test]
    fn failing_homebrew_probe_is_soft() {
        let temp = TempDir::new().expect("temp dir");
        let runner = FakeRunner::new().respond("brew list --versions", 1, "");
        let (mgr, _runner) = manager(config(temp.path()), Platform::MacosIntel, runner);

        let listing = mgr.list().expect("list");

        assert!(matches!(
            &listing.package_managed[..],
            [PackageProbe {
                manager: PackageManager::Homebrew,
                outcome: ProbeOutcome::Unavailable { .. },
            }]
        ));
    }

    #[test]
    fn listing_serializes_with_status_tags() {
        let listing = VersionListing {
            manager_managed: vec!["8.1.2".to_string()],
            active: Some("8.1.2".to_string()),
            package_managed: vec![PackageProbe {
                manager: PackageManager::Homebrew,
                outcome: ProbeOutcome::Unavailable {
                    reason: "brew not found".to_string(),
                },
            }],
        };

        let json = serde_json::to_value(&listing).expect("serialize");

        assert_eq!(json["manager_managed"][0], "8.1.2");
        assert_eq!(json["active"], "8.1.2");
        assert_eq!(json["package_managed"][0]["manager"], "homebrew");
        assert_eq!(
            json["package_managed"][0]["outcome"]["status"],
            "unavailable"
        );
    }
}
