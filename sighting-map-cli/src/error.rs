//! Error types emitted by the sighting map CLI.
//!
//! Keep this error type reasonably small, as the CLI helpers return
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use sighting_map_core::{ContentError, MountError, ParseBasemapError};
use thiserror::Error;

/// Errors emitted by the sighting map CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The basemap name is not one of the presets.
    #[error(transparent)]
    InvalidBasemap(#[from] ParseBasemapError),
    /// The click position is not a valid `lat,lon` pair.
    #[error("click position {value:?} is not a valid latitude,longitude pair")]
    InvalidClickPosition { value: String },
    /// Opening the sightings file failed.
    #[error("failed to open sightings at {path:?}: {source}")]
    OpenSightings {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The sightings file is not a JSON array of sightings.
    #[error("failed to parse sightings JSON at {path:?}: {source}")]
    ParseSightings {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The sightings decoded but cannot be placed on the map.
    #[error("sightings in {path:?} cannot be mapped: {source}")]
    InvalidSightings {
        path: Utf8PathBuf,
        #[source]
        source: ContentError,
    },
    /// The sighting to select is not in the file.
    #[error("no sighting with id {id} to select")]
    UnknownSighting { id: u64 },
    /// The headless map could not be mounted.
    #[error(transparent)]
    Mount(#[from] MountError),
    /// The headless backend produced no surface to report on.
    #[error("the replay produced no map surface")]
    MissingSnapshot,
    /// Serializing the replay report failed.
    #[error("failed to serialize replay report: {0}")]
    SerializeReport(#[source] serde_json::Error),
    /// Writing the replay report failed.
    #[error("failed to write replay output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
