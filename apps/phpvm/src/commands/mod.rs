//! Command modules for the phpvm CLI.
//!
//! - [`install`] - Install a PHP version
//! - [`uninstall`] - Remove a PHP version
//! - [`list`] - List installed versions
//! - [`use_cmd`] - Switch the active version
//! - [`current`] - Show the active version

pub mod current;
pub mod install;
pub mod list;
pub mod uninstall;
pub mod use_cmd;
