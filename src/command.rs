//! Assembly of the final terraform invocation.

use std::fmt;

use log::debug;

use crate::args::{FlagValue, Invocation};

/// Name of the wrapped binary.
pub const TOOL: &str = "terraform";

/// Environment variable controlling terraform's diagnostic verbosity.
pub const LOG_ENV_VAR: &str = "TF_LOG";

/// Log level names recognized as control flags rather than tool flags.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A fully assembled subprocess invocation: program, literal argument
/// list and extra environment entries.
///
/// Arguments are kept as a literal list handed straight to the spawn
/// primitive, so `-key=value` tokens survive without any shell quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl ToolCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ToolCommand {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: Vec::new(),
        }
    }

    /// The full argument vector, program first.
    #[must_use]
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{key}={value} ")?;
        }
        write!(f, "{}", self.argv().join(" "))
    }
}

/// Assemble the terraform invocation for a parsed command line.
///
/// The first flag whose key names a log level becomes a `TF_LOG`
/// environment entry. The `watch` flag and log-level keys are control
/// flags and never forwarded; every remaining flag is emitted as a
/// single `-key` or `-key=value` token, preserving parse order.
#[must_use]
pub fn build(invocation: &Invocation) -> ToolCommand {
    let mut env = Vec::new();
    if let Some(flag) = invocation
        .flags
        .iter()
        .find(|flag| LOG_LEVELS.contains(&flag.key.as_str()))
    {
        env.push((LOG_ENV_VAR.to_string(), flag.key.clone()));
    }

    let mut args = invocation.commands.clone();
    for flag in &invocation.flags {
        if flag.key == "watch" || LOG_LEVELS.contains(&flag.key.as_str()) {
            continue;
        }
        let mut token = format!("-{}", flag.key);
        match &flag.value {
            FlagValue::Absent => {}
            FlagValue::Bool(value) => {
                token.push('=');
                token.push_str(if *value { "true" } else { "false" });
            }
            FlagValue::Text(value) => {
                token.push('=');
                token.push_str(value);
            }
        }
        args.push(token);
    }

    let command = ToolCommand {
        program: TOOL.to_string(),
        args,
        env,
    };
    debug!("Built command '{command}'");
    command
}
