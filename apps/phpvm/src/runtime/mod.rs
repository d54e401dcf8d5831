//! PHP version management engine.
//!
//! ## Module Structure
//!
//! - [`platform`] - OS, architecture and Linux distribution detection
//! - [`distribution`] - Download URLs and package-manager selection
//! - [`package_manager`] - Homebrew, apt and dnf command templates
//! - [`runner`] - Subprocess invocation
//! - [`download`] - HTTP archive acquisition
//! - [`archive`] - tar.gz extraction
//! - [`paths`] - Registry layout and active-version marker
//! - [`manager`] - Install and uninstall workflows
//! - [`activation`] - Symlink swap and marker update
//! - [`registry`] - Installed-version listing
//! - [`pin`] - `.phpvmrc` discovery
//! - [`autoswitch`] - Pin-driven switching before dispatch

pub mod activation;
pub mod archive;
pub mod autoswitch;
pub mod distribution;
pub mod download;
pub mod manager;
pub mod package_manager;
pub mod paths;
pub mod pin;
pub mod platform;
pub mod registry;
pub mod runner;

pub use activation::Activation;
pub use autoswitch::{AutoSwitchOutcome, auto_switch};
pub use manager::{InstallOutcome, UninstallOutcome, VersionManager};
pub use paths::PhpvmPaths;
pub use platform::Platform;
pub use registry::{ProbeOutcome, VersionListing};
