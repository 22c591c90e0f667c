//! Replay command implementation for the sighting map CLI.
//!
//! A replay mounts a headless map, assigns the sightings from a JSON file,
//! lets the deferred viewport fit run, then applies an optional external
//! selection and an optional click before printing the map state.

use std::io::{BufReader, Write};
use std::rc::Rc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use clap::Parser;
use geo::Coord;
use log::debug;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use sighting_map_core::{
    Basemap, BasemapKind, DEFAULT_FIT_DELAY, HeadlessBackend, ManualClock, MapSnapshot,
    MapSynchronizer, Sighting, SynchronizerConfig, is_valid_location, lat_lng,
};

use crate::{
    ARG_REPLAY_BASEMAP, ARG_REPLAY_CLICK_AT, ARG_REPLAY_FIT_DELAY_MS, ARG_REPLAY_SELECT,
    ARG_REPLAY_SIGHTINGS, CliError, ENV_REPLAY_SIGHTINGS,
};

/// CLI arguments for the `replay` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Render a JSON array of sightings on a headless map, let the \
                 viewport settle, then optionally select a sighting and click \
                 a position. The resulting map state is printed as JSON.",
    about = "Replay sightings through a headless map"
)]
#[ortho_config(prefix = "SIGHTING_MAP")]
pub(crate) struct ReplayArgs {
    /// Path to a JSON file containing an array of sightings.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) sightings: Option<Utf8PathBuf>,
    /// Basemap preset: `openstreetmap` (alias `osm`) or `polar`.
    #[arg(long = ARG_REPLAY_BASEMAP, value_name = "name")]
    #[serde(default)]
    pub(crate) basemap: Option<String>,
    /// Delay before the viewport fits new content, in milliseconds.
    #[arg(long = ARG_REPLAY_FIT_DELAY_MS, value_name = "ms")]
    #[serde(default)]
    pub(crate) fit_delay_ms: Option<u64>,
    /// Identifier of a sighting to select from outside the map.
    #[arg(long = ARG_REPLAY_SELECT, value_name = "id")]
    #[serde(default)]
    pub(crate) select: Option<u64>,
    /// Position to click after selecting, as `latitude,longitude`.
    #[arg(long = ARG_REPLAY_CLICK_AT, value_name = "lat,lon", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) click_at: Option<String>,
}

impl ReplayArgs {
    pub(crate) fn into_config(self) -> Result<ReplayConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ReplayConfig::try_from(merged)
    }
}

/// Resolved `replay` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReplayConfig {
    /// Path to the sightings file.
    pub(crate) sightings: Utf8PathBuf,
    /// Basemap preset to mount.
    pub(crate) basemap: BasemapKind,
    /// Viewport fit delay.
    pub(crate) fit_delay: Duration,
    /// Sighting to select externally.
    pub(crate) select: Option<u64>,
    /// Position to click.
    pub(crate) click_at: Option<Coord<f64>>,
}

impl TryFrom<ReplayArgs> for ReplayConfig {
    type Error = CliError;

    fn try_from(args: ReplayArgs) -> Result<Self, Self::Error> {
        let sightings = args.sightings.ok_or(CliError::MissingArgument {
            field: ARG_REPLAY_SIGHTINGS,
            env: ENV_REPLAY_SIGHTINGS,
        })?;
        let basemap = args
            .basemap
            .as_deref()
            .map(str::parse::<BasemapKind>)
            .transpose()?
            .unwrap_or_default();
        let fit_delay = args
            .fit_delay_ms
            .map_or(DEFAULT_FIT_DELAY, Duration::from_millis);
        let click_at = args.click_at.as_deref().map(parse_click_at).transpose()?;

        Ok(Self {
            sightings,
            basemap,
            fit_delay,
            select: args.select,
            click_at,
        })
    }
}

/// Parses a `latitude,longitude` pair.
pub(crate) fn parse_click_at(value: &str) -> Result<Coord<f64>, CliError> {
    let invalid = || CliError::InvalidClickPosition {
        value: value.to_owned(),
    };
    let (latitude, longitude) = value.split_once(',').ok_or_else(invalid)?;
    let latitude: f64 = latitude.trim().parse().map_err(|_| invalid())?;
    let longitude: f64 = longitude.trim().parse().map_err(|_| invalid())?;
    let location = lat_lng(latitude, longitude);
    if is_valid_location(location) {
        Ok(location)
    } else {
        Err(invalid())
    }
}

/// What a replay leaves behind.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ReplayReport {
    /// Identifier of the selected sighting.
    pub(crate) selected: Option<u64>,
    /// Species of the selected sighting.
    pub(crate) selected_species: Option<String>,
    /// Headless map state after the replay.
    pub(crate) map: MapSnapshot,
}

pub(crate) fn run_replay(args: ReplayArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_replay_with(args, &mut stdout)
}

pub(crate) fn run_replay_with(args: ReplayArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let report = execute_replay(&config)?;
    write_report(writer, &report)
}

pub(crate) fn execute_replay(config: &ReplayConfig) -> Result<ReplayReport, CliError> {
    let sightings: Vec<Rc<Sighting>> = load_sightings(&config.sightings)?
        .into_iter()
        .map(Rc::new)
        .collect();

    let backend = HeadlessBackend::new();
    let clock = ManualClock::new();
    let mut map = MapSynchronizer::with_clock(
        backend.clone(),
        clock.clone(),
        SynchronizerConfig {
            basemap: Basemap::from(config.basemap),
            fit_delay: config.fit_delay,
        },
    );
    map.on_selection_change(|sighting: &Rc<Sighting>| {
        debug!("click selected sighting {:?} ({})", sighting.id, sighting.species);
    });
    map.mount()?;
    map.set_content(sightings.clone())
        .map_err(|source| CliError::InvalidSightings {
            path: config.sightings.clone(),
            source,
        })?;

    clock.advance(config.fit_delay);
    map.run_pending();

    if let Some(id) = config.select {
        let selected = sightings
            .iter()
            .find(|sighting| sighting.id == Some(id))
            .cloned()
            .ok_or(CliError::UnknownSighting { id })?;
        map.set_selection(Some(selected));
    }

    if let Some(position) = config.click_at {
        match backend.click_at(position) {
            Some(marker) => debug!("click at {position:?} hit marker {marker:?}"),
            None => debug!("click at {position:?} hit no marker"),
        }
        map.dispatch_clicks();
    }

    let selected = map.selection().cloned();
    let snapshot = backend.snapshot().ok_or(CliError::MissingSnapshot)?;
    Ok(ReplayReport {
        selected: selected.as_ref().and_then(|sighting| sighting.id),
        selected_species: selected.map(|sighting| sighting.species.clone()),
        map: snapshot,
    })
}

/// Loads a JSON array of [`Sighting`] records from disk.
pub(crate) fn load_sightings(path: &Utf8Path) -> Result<Vec<Sighting>, CliError> {
    let file = fs_utf8::File::open_ambient(path, ambient_authority()).map_err(|source| {
        CliError::OpenSightings {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| CliError::ParseSightings {
        path: path.to_path_buf(),
        source,
    })
}

fn write_report(writer: &mut dyn Write, report: &ReplayReport) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(report).map_err(CliError::SerializeReport)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}
