//! Subprocess execution, in two modes.
//!
//! Captured mode collects output and treats any stderr as a failure;
//! it backs the auxiliary queries (terraform presence probe, working
//! directory). Streamed mode inherits the terminal and, by default,
//! swallows failures so a broken terraform run never takes the
//! wrapper down with it.

use std::path::PathBuf;
use std::process::{Command as ProcessCommand, Stdio};

use log::debug;
use thiserror::Error;

use crate::command::{TOOL, ToolCommand};

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("empty command, nothing to execute")]
    EmptyCommand,
    #[error(
        "'terraform' application not found. Please download and install 'terraform' first: https://www.terraform.io/downloads.html"
    )]
    ToolMissing,
    #[error("command wrote to stderr: {0}")]
    Stderr(String),
    #[error("command exited with status code {code:?}")]
    Failed { code: Option<i32> },
    #[error("failed to run command: {0}")]
    Io(#[from] std::io::Error),
}

fn to_process(command: &ToolCommand) -> Result<ProcessCommand, ExecError> {
    if command.program.trim().is_empty() {
        return Err(ExecError::EmptyCommand);
    }
    let mut process = ProcessCommand::new(&command.program);
    // Absent tokens are dropped rather than passed as empty strings
    process.args(command.args.iter().filter(|arg| !arg.is_empty()));
    process.envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    Ok(process)
}

/// Run a command and capture its output.
///
/// # Errors
///
/// Returns `ExecError::Stderr` if the command wrote anything to
/// stderr, `ExecError::EmptyCommand` for an empty program name, or an
/// IO error if it could not be spawned.
pub fn run_captured(command: &ToolCommand) -> Result<String, ExecError> {
    let mut process = to_process(command)?;
    let output = process.stdin(Stdio::null()).output()?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        return Err(ExecError::Stderr(stderr.trim().to_string()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run a command with output streamed to the invoking terminal.
///
/// With `silent` set (the default at every call site) a failed or
/// unspawnable command is logged at debug level and reported as
/// success, so transient tool failures never interrupt the caller.
/// An empty program name is a usage error regardless of `silent`.
///
/// # Errors
///
/// Returns `ExecError::EmptyCommand` always, and `ExecError::Failed`
/// or an IO error only when `silent` is false.
pub fn run_streamed(command: &ToolCommand, silent: bool) -> Result<(), ExecError> {
    let mut process = to_process(command)?;
    match process.status() {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => {
            if silent {
                debug!("Command '{command}' exited with {status}");
                Ok(())
            } else {
                Err(ExecError::Failed {
                    code: status.code(),
                })
            }
        }
        Err(err) => {
            if silent {
                debug!("Command '{command}' could not be run: {err}");
                Ok(())
            } else {
                Err(err.into())
            }
        }
    }
}

/// Verify that the terraform binary is available.
///
/// # Errors
///
/// Returns `ExecError::ToolMissing` if the version probe fails for any
/// reason.
pub fn ensure_tool_installed() -> Result<(), ExecError> {
    let probe = ToolCommand::new(TOOL, ["-v"]);
    match run_captured(&probe) {
        Ok(_) => Ok(()),
        Err(err) => {
            debug!("Tool probe failed: {err}");
            Err(ExecError::ToolMissing)
        }
    }
}

/// Resolve the directory the wrapper was invoked from.
///
/// The wrapper can be installed globally and run anywhere, so the
/// directory is queried at runtime rather than baked in.
///
/// # Errors
///
/// Returns an error if the query command fails.
pub fn working_directory() -> Result<PathBuf, ExecError> {
    let stdout = run_captured(&ToolCommand::new("pwd", std::iter::empty::<&str>()))?;
    Ok(PathBuf::from(stdout.trim()))
}
