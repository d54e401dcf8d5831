//! Subprocess invocation.
//!
//! Every external program phpvm touches (package managers, `brew`, the
//! installed `php -v`) goes through [`CommandRunner`], so the engine can be
//! driven by [`SystemRunner`] in the binary and by a scripted fake in tests.

use std::fmt;
use std::process::{Command, Stdio};

use crate::errors::{PhpvmError, Result};

/// A program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
    /// When set the child shares the terminal; otherwise output is captured.
    pub inherit_stdio: bool,
}

impl ShellCommand {
    /// A command whose stdout and stderr are captured.
    #[must_use]
    pub fn captured(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
            inherit_stdio: false,
        }
    }

    /// A command that runs attached to the user's terminal.
    #[must_use]
    pub fn interactive(program: &str, args: &[&str]) -> Self {
        Self {
            inherit_stdio: true,
            ..Self::captured(program, args)
        }
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Result of a finished child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the child was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Capability to run external programs.
pub trait CommandRunner: Send + Sync {
    /// Runs `command` to completion.
    ///
    /// # Errors
    ///
    /// Returns the spawn error when the program cannot be started.
    fn run(&self, command: &ShellCommand) -> std::io::Result<CommandOutput>;

    /// Returns whether `program` can be found on `PATH`.
    fn exists(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Runs commands with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &ShellCommand) -> std::io::Result<CommandOutput> {
        tracing::debug!(command = %command, "running");
        let mut process = Command::new(&command.program);
        process.args(&command.args);

        if command.inherit_stdio {
            let status = process
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()?;
            return Ok(CommandOutput {
                code: status.code(),
                ..CommandOutput::default()
            });
        }

        let output = process.stdin(Stdio::null()).output()?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs `command` and turns a spawn error or non-zero exit into
/// `CommandFailed`.
///
/// # Errors
///
/// Returns `CommandFailed` naming the command line and exit code.
pub fn run_checked(runner: &dyn CommandRunner, command: &ShellCommand) -> Result<CommandOutput> {
    match runner.run(command) {
        Ok(output) if output.success() => Ok(output),
        Ok(output) => {
            tracing::debug!(command = %command, stderr = %output.stderr.trim(), "command failed");
            Err(PhpvmError::command_failed(command.to_string(), output.code))
        }
        Err(e) => {
            tracing::debug!(command = %command, error = %e, "spawn failed");
            Err(PhpvmError::command_failed(command.to_string(), None))
        }
    }
}
