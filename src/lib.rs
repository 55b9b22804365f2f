//! Core implementation of the terra terraform wrapper
//!
//! Terra rewrites shorthand subcommands and flags (`terra p -a` for
//! `terraform plan -auto-approve`) into the canonical invocation,
//! forwards it to the `terraform` binary, and can keep the process
//! alive to re-run the same invocation whenever `.tf`/`.tfvars` files
//! change.

use std::path::PathBuf;

use log::debug;

use crate::args::Invocation;
use crate::command::ToolCommand;
use crate::exec::ExecError;

pub mod args;
pub mod command;
pub mod exec;
pub mod watch;

/// What the process should do once the initial command has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Exit immediately with success.
    Exit,
    /// Keep the process alive, watching `target` and re-running
    /// `command` on configuration changes.
    Watch {
        target: PathBuf,
        command: ToolCommand,
    },
}

/// Run the initial command for a parsed invocation and decide whether
/// the process should stay alive for watch mode.
///
/// A `test` flag short-circuits before any subprocess is spawned.
/// Otherwise the terraform binary is probed, the invocation is
/// assembled and run with inherited output (failures of that run are
/// silenced), and a `watch` flag turns into a [`Outcome::Watch`]
/// targeting either the flag's directory or the invoking working
/// directory.
///
/// # Errors
///
/// Returns `ExecError::ToolMissing` if terraform is not installed, or
/// any error from resolving the working directory.
pub fn execute(invocation: &Invocation) -> Result<Outcome, ExecError> {
    if invocation.has_flag("test") {
        debug!("Test flag set, stopping before execution");
        return Ok(Outcome::Exit);
    }

    exec::ensure_tool_installed()?;

    let command = command::build(invocation);
    exec::run_streamed(&command, true)?;

    match invocation.watch_request() {
        None => Ok(Outcome::Exit),
        Some(explicit) => {
            let target = match explicit {
                Some(dir) => dir,
                None => exec::working_directory()?,
            };
            Ok(Outcome::Watch { target, command })
        }
    }
}
