//! Running the --exec command over a saved image.

use std::fmt;
use std::process::{Command, ExitStatus};

/// Error from running the user's command.
#[derive(Debug)]
pub enum ExecError {
    /// The rendered command had no program name
    EmptyCommand,
    /// Spawning the child process failed
    Spawn(std::io::Error),
    /// The child exited unsuccessfully
    Failed(ExitStatus),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::EmptyCommand => write!(f, "Command pattern produced an empty command"),
            ExecError::Spawn(err) => write!(f, "Failed to run command: {}", err),
            ExecError::Failed(status) => write!(f, "Command exited unsuccessfully: {}", status),
        }
    }
}

impl std::error::Error for ExecError {}

/// Run an argument vector produced by the command pattern evaluator.
///
/// Succeeds if and only if the child does.
pub fn run_command(args: &[String]) -> Result<(), ExecError> {
    let (program, rest) = match args.split_first() {
        Some((program, rest)) if !program.is_empty() => (program, rest),
        _ => return Err(ExecError::EmptyCommand),
    };
    tracing::debug!(command = %program, "running exec command");
    let status = Command::new(program)
        .args(rest)
        .status()
        .map_err(ExecError::Spawn)?;
    if status.success() {
        Ok(())
    } else {
        Err(ExecError::Failed(status))
    }
}
