//! Command-line interface for replaying sightings through a headless map.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod replay;

pub use error::CliError;

use replay::ReplayArgs;

const ARG_REPLAY_SIGHTINGS: &str = "sightings";
const ARG_REPLAY_BASEMAP: &str = "basemap";
const ARG_REPLAY_FIT_DELAY_MS: &str = "fit-delay-ms";
const ARG_REPLAY_SELECT: &str = "select";
const ARG_REPLAY_CLICK_AT: &str = "click-at";
const ENV_REPLAY_SIGHTINGS: &str = "SIGHTING_MAP_CMDS_REPLAY_SIGHTINGS";

/// Run the sighting map CLI with the current process arguments and
/// environment.
///
/// # Errors
///
/// Returns a [`CliError`] when arguments or configuration are invalid, the
/// sightings file cannot be read, or the report cannot be written.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Replay(args) => replay::run_replay(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "sighting-map",
    about = "Headless tooling for the sighting map synchronizer",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a sightings file on a headless map and print the result.
    Replay(ReplayArgs),
}

#[cfg(test)]
mod tests;
