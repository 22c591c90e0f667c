//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use sighting_map_cli::{CliError, run};

fn main() {
    match run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("sighting-map: {err}");
            std::process::exit(1);
        }
    }
}
