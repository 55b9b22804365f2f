use std::process::ExitCode;

use clap::Parser;
use log::debug;

use terra::{Outcome, args, execute, watch};

/// Every token after the binary name belongs to the shaping pipeline,
/// so clap's own help/version handling is disabled and hyphen values
/// pass through untouched.
#[derive(Parser, Debug)]
#[command(
    name = "terra",
    about = "Shorthand wrapper around the terraform CLI",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    /// Command and flags forwarded to terraform, shorthands expanded
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let invocation = args::parse(cli.args);
    debug!("Parsed invocation: {invocation:?}");

    match execute(&invocation)? {
        Outcome::Exit => Ok(ExitCode::SUCCESS),
        Outcome::Watch { target, command } => {
            watch::run(&target, &command).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
