//! Focused unit tests covering replay configuration and sightings loading.

use super::helpers::{SightingsFile, TWO_SIGHTINGS};
use super::*;
use crate::replay::{
    ReplayArgs, ReplayConfig, execute_replay, load_sightings, parse_click_at,
};
use camino::Utf8PathBuf;
use rstest::rstest;
use sighting_map_core::{
    BasemapKind, ContentError, DEFAULT_FIT_DELAY, MarkerIcon, lat_lng,
};
use std::time::Duration;

fn config_for(file: &SightingsFile) -> ReplayConfig {
    ReplayConfig {
        sightings: file.path().to_path_buf(),
        basemap: BasemapKind::OpenStreetMap,
        fit_delay: DEFAULT_FIT_DELAY,
        select: None,
        click_at: None,
    }
}

#[rstest]
fn converting_without_sightings_errors() {
    let err = ReplayConfig::try_from(ReplayArgs::default()).expect_err("missing sightings");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_REPLAY_SIGHTINGS);
            assert_eq!(env, ENV_REPLAY_SIGHTINGS);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn conversion_applies_defaults() {
    let args = ReplayArgs {
        sightings: Some(Utf8PathBuf::from("sightings.json")),
        ..ReplayArgs::default()
    };

    let config = ReplayConfig::try_from(args).expect("config should build");
    assert_eq!(config.basemap, BasemapKind::OpenStreetMap);
    assert_eq!(config.fit_delay, DEFAULT_FIT_DELAY);
    assert_eq!(config.select, None);
    assert_eq!(config.click_at, None);
}

#[rstest]
fn conversion_reads_every_option() {
    let args = ReplayArgs {
        sightings: Some(Utf8PathBuf::from("sightings.json")),
        basemap: Some("Polar".to_owned()),
        fit_delay_ms: Some(50),
        select: Some(2),
        click_at: Some("-10.5, 20".to_owned()),
    };

    let config = ReplayConfig::try_from(args).expect("config should build");
    assert_eq!(config.basemap, BasemapKind::Polar);
    assert_eq!(config.fit_delay, Duration::from_millis(50));
    assert_eq!(config.select, Some(2));
    assert_eq!(config.click_at, Some(lat_lng(-10.5, 20.0)));
}

#[rstest]
fn conversion_rejects_unknown_basemap() {
    let args = ReplayArgs {
        sightings: Some(Utf8PathBuf::from("sightings.json")),
        basemap: Some("satellite".to_owned()),
        ..ReplayArgs::default()
    };

    let err = ReplayConfig::try_from(args).expect_err("unknown basemap");
    assert!(matches!(err, CliError::InvalidBasemap(_)), "found {err:?}");
}

#[rstest]
#[case("10,20", Some(lat_lng(10.0, 20.0)))]
#[case(" -45.5 , 170.25 ", Some(lat_lng(-45.5, 170.25)))]
#[case("10;20", None)]
#[case("north,20", None)]
#[case("95,20", None)]
#[case("10,181", Some(lat_lng(10.0, 181.0)))]
#[case("10,inf", None)]
#[case("NaN,0", None)]
fn click_positions_are_parsed_and_validated(
    #[case] value: &str,
    #[case] expected: Option<geo::Coord<f64>>,
) {
    match (parse_click_at(value), expected) {
        (Ok(actual), Some(expected)) => assert_eq!(actual, expected),
        (Err(CliError::InvalidClickPosition { value: reported }), None) => {
            assert_eq!(reported, value);
        }
        (other, _) => panic!("unexpected outcome for {value:?}: {other:?}"),
    }
}

#[rstest]
fn loading_reads_partial_records() {
    let file = SightingsFile::with_contents(r#"[{"id": 7, "species": "Osprey"}]"#);

    let sightings = load_sightings(file.path()).expect("sightings should load");
    assert_eq!(sightings.len(), 1);
    assert_eq!(sightings.first().and_then(|s| s.id), Some(7));
    assert_eq!(sightings.first().and_then(|s| s.latitude), None);
}

#[rstest]
fn loading_a_missing_file_reports_the_path() {
    let file = SightingsFile::with_contents("[]");
    let missing = file.path().with_file_name("absent.json");

    let err = load_sightings(&missing).expect_err("missing file");
    match err {
        CliError::OpenSightings { path, .. } => assert_eq!(path, missing),
        other => panic!("expected OpenSightings, found {other:?}"),
    }
}

#[rstest]
fn loading_rejects_malformed_json() {
    let file = SightingsFile::with_contents("{ not json");

    let err = load_sightings(file.path()).expect_err("malformed file");
    assert!(matches!(err, CliError::ParseSightings { .. }), "found {err:?}");
}

#[rstest]
fn replay_renders_and_fits_every_sighting() {
    let file = SightingsFile::with_contents(TWO_SIGHTINGS);

    let report = execute_replay(&config_for(&file)).expect("replay should succeed");
    assert_eq!(report.selected, None);
    assert_eq!(report.map.markers.len(), 2);
    assert!(report.map.markers.iter().all(|marker| marker.clustered));
    assert_eq!(report.map.fits.len(), 1);
    assert!(!report.map.released);
}

#[rstest]
fn replay_selection_then_click_moves_the_highlight() {
    let file = SightingsFile::with_contents(TWO_SIGHTINGS);
    let config = ReplayConfig {
        select: Some(2),
        click_at: Some(lat_lng(10.1, 19.9)),
        ..config_for(&file)
    };

    let report = execute_replay(&config).expect("replay should succeed");
    assert_eq!(report.selected, Some(1));
    assert_eq!(report.selected_species.as_deref(), Some("Grey heron"));
    let icons: Vec<MarkerIcon> = report.map.markers.iter().map(|m| m.icon).collect();
    assert_eq!(icons, vec![MarkerIcon::Highlighted, MarkerIcon::Default]);
    assert_eq!(report.map.pans.len(), 1);
}

#[rstest]
fn replay_rejects_unknown_selection() {
    let file = SightingsFile::with_contents(TWO_SIGHTINGS);
    let config = ReplayConfig {
        select: Some(9),
        ..config_for(&file)
    };

    let err = execute_replay(&config).expect_err("unknown selection");
    assert!(matches!(err, CliError::UnknownSighting { id: 9 }), "found {err:?}");
}

#[rstest]
fn replay_rejects_sightings_without_coordinates() {
    let file = SightingsFile::with_contents(r#"[{"id": 1, "species": "Osprey"}]"#);

    let err = execute_replay(&config_for(&file)).expect_err("unmappable sightings");
    match err {
        CliError::InvalidSightings { source, .. } => {
            assert_eq!(source, ContentError::MissingLocation { index: 0 });
        }
        other => panic!("expected InvalidSightings, found {other:?}"),
    }
}
