//! Capability traits for the mapping library behind the synchronizer.
//!
//! A [`MapBackend`] creates map surfaces; a [`MapSurface`] exposes the handful
//! of operations the synchronizer needs: tile layer attachment, marker
//! creation, a clustering container with a click stream, icon mutation,
//! bounds fitting and centre panning. Any library offering these is
//! interchangeable. Marker grouping by proximity belongs to the surface's
//! cluster layer and is never reimplemented by callers.

use std::fmt::Debug;
use std::hash::Hash;

use geo::{Coord, Rect};
use thiserror::Error;

use crate::{Basemap, TileLayer};

/// Marker appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum MarkerIcon {
    /// Library default marker.
    #[default]
    Default,
    /// Marker of the selected entity.
    Highlighted,
}

/// Failures reported by a mapping backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    /// The map container could not be created.
    #[error("map container unavailable: {reason}")]
    Unavailable {
        /// Backend-supplied explanation.
        reason: String,
    },
    /// The tile layer could not be attached.
    #[error("failed to attach tile layer {url_template}: {reason}")]
    TileLayer {
        /// Template of the rejected layer.
        url_template: String,
        /// Backend-supplied explanation.
        reason: String,
    },
    /// Click events from the cluster layer could not be subscribed to.
    #[error("failed to subscribe to cluster clicks: {reason}")]
    ClickSubscription {
        /// Backend-supplied explanation.
        reason: String,
    },
}

/// Factory for map surfaces.
///
/// # Examples
/// ```
/// use sighting_map_core::{Basemap, HeadlessBackend, MapBackend, MapSurface};
///
/// let backend = HeadlessBackend::new();
/// let mut surface = backend.create_surface(&Basemap::polar())?;
/// surface.release();
/// assert_eq!(backend.releases(), 1);
/// # Ok::<(), sighting_map_core::SurfaceError>(())
/// ```
pub trait MapBackend {
    /// Surface type produced by this backend.
    type Surface: MapSurface;

    /// Create a map container showing `basemap`'s initial view with an empty
    /// cluster layer attached.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Unavailable`] when no map container can be
    /// created.
    fn create_surface(&self, basemap: &Basemap) -> Result<Self::Surface, SurfaceError>;
}

/// A live map owned by exactly one synchronizer.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
pub trait MapSurface {
    /// Handle to a marker created on this surface.
    type Marker: Clone + Eq + Hash + Debug;

    /// Attach a raster tile layer.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::TileLayer`] when the layer cannot be attached.
    fn add_tile_layer(&mut self, tiles: &TileLayer) -> Result<(), SurfaceError>;

    /// Start recording click events from the cluster layer.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::ClickSubscription`] when the cluster layer
    /// cannot report clicks.
    fn subscribe_cluster_clicks(&mut self) -> Result<(), SurfaceError>;

    /// Pop the oldest pending cluster click, if any.
    fn next_cluster_click(&mut self) -> Option<Self::Marker>;

    /// Create a marker with the default icon. The marker is not visible until
    /// added to the cluster layer.
    fn create_marker(&mut self, location: Coord<f64>) -> Self::Marker;

    /// Add a marker to the cluster layer.
    fn add_to_cluster(&mut self, marker: &Self::Marker);

    /// Remove every marker from the cluster layer. Removed markers are
    /// destroyed.
    fn clear_cluster(&mut self);

    /// Bounding box of the markers in the cluster layer, `None` when empty.
    fn cluster_bounds(&self) -> Option<Rect<f64>>;

    /// Change a marker's appearance.
    fn set_icon(&mut self, marker: &Self::Marker, icon: MarkerIcon);

    /// Centre the view on `bounds`, zooming as far in as the basemap's
    /// maximum zoom allows while keeping `bounds` visible.
    fn fit_bounds(&mut self, bounds: Rect<f64>);

    /// Move the view centre to `center` without changing zoom.
    fn pan_to(&mut self, center: Coord<f64>);

    /// Tear the map down. Implementations must tolerate repeated calls.
    fn release(&mut self);
}
