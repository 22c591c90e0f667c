//! Facade crate for the sighting map synchronizer.
//!
//! This crate re-exports the synchronizer, the entity and rendering traits,
//! and the headless backend. Shared test helpers are available behind the
//! `test-support` feature.

#![forbid(unsafe_code)]

pub use sighting_map_core::{
    Basemap, BasemapKind, Clock, ContentError, DEFAULT_FIT_DELAY, Entity, HeadlessBackend,
    HeadlessSurface, ManualClock, MapBackend, MapSnapshot, MapSurface, MapSynchronizer,
    MarkerIcon, MountError, Sighting, SurfaceError, SynchronizerConfig, SystemClock, TileLayer,
    is_valid_location, lat_lng,
};

#[cfg(feature = "test-support")]
pub use sighting_map_core::test_support;
