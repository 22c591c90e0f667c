//! Map selection synchronization for wildlife sighting trackers.
//!
//! A [`MapSynchronizer`] keeps a clustered marker map consistent with a list
//! of entities and a single selection. Content changes rebuild every marker
//! and fit the viewport after [`DEFAULT_FIT_DELAY`]; external selection
//! changes move the highlight and pan; marker clicks write the selection back
//! and notify a listener. The map itself sits behind the [`MapBackend`] and
//! [`MapSurface`] traits, with [`HeadlessBackend`] as the in-memory
//! implementation used by tests and the command-line replayer.
//!
//! Entities are anything implementing [`Entity`]; [`Sighting`] is the record
//! the tracker ships with.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod basemap;
mod clock;
mod entity;
mod error;
mod headless;
mod marker;
mod selection;
mod sighting;
mod surface;
mod synchronizer;
mod viewport;

pub use basemap::{Basemap, BasemapKind, IconSpec, ParseBasemapError, TileLayer};
pub use clock::{Clock, ManualClock, SystemClock};
pub use entity::{Entity, is_valid_location, lat_lng};
pub use error::{ContentError, MountError};
pub use headless::{
    BoundsSnapshot, HIT_TOLERANCE_DEGREES, HeadlessBackend, HeadlessMarker, HeadlessMarkerId,
    HeadlessSurface, LatLng, MapSnapshot, MarkerSnapshot, MountFailure,
};
pub use marker::{Marker, MarkerCache};
pub use selection::SelectionState;
pub use sighting::Sighting;
pub use surface::{MapBackend, MapSurface, MarkerIcon, SurfaceError};
pub use synchronizer::{MapSynchronizer, SynchronizerConfig};
pub use viewport::{DEFAULT_FIT_DELAY, ViewportController};

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;
