//! In-memory mapping backend.
//!
//! `HeadlessBackend` implements the surface capabilities without a browser:
//! it records the view, tile layer, markers, icons, cluster membership, fits,
//! pans and releases so a host can replay map interactions and inspect the
//! result. Clicks are injected through the backend handle, either on a marker
//! directly or at a position resolved against the clustered markers through
//! an R\*-tree.
//!
//! Clones of a backend share state, so a host keeps one handle for
//! inspection while the synchronizer owns another.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use geo::{BoundingRect, Coord, MultiPoint, Point, Rect};
use rstar::{AABB, RTree, RTreeObject};

use crate::{Basemap, BasemapKind, MapBackend, MapSurface, MarkerIcon, SurfaceError, TileLayer};

/// Search radius, in degrees, for [`HeadlessBackend::click_at`].
pub const HIT_TOLERANCE_DEGREES: f64 = 0.5;

/// Longitude span visible at zoom 0.
const WORLD_WIDTH_DEGREES: f64 = 360.0;
/// Latitude span visible at zoom 0.
const WORLD_HEIGHT_DEGREES: f64 = 180.0;

/// Identifier of a marker on a headless surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeadlessMarkerId(pub u64);

/// A live marker on a headless surface.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMarker {
    /// Marker identifier.
    pub id: HeadlessMarkerId,
    /// Marker position.
    pub location: Coord<f64>,
    /// Current appearance.
    pub icon: MarkerIcon,
    /// Whether the marker sits in the cluster layer.
    pub clustered: bool,
}

/// Stage at which a failing backend rejects surface creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountFailure {
    /// Creating the map container fails.
    Container,
    /// Attaching the tile layer fails.
    TileLayer,
    /// Subscribing to cluster clicks fails.
    ClickSubscription,
}

#[derive(Debug)]
struct HeadlessMap {
    basemap: Basemap,
    center: Coord<f64>,
    zoom: u8,
    tile_layer: Option<TileLayer>,
    markers: Vec<HeadlessMarker>,
    clicks_subscribed: bool,
    pending_clicks: VecDeque<HeadlessMarkerId>,
    fits: Vec<Rect<f64>>,
    pans: Vec<Coord<f64>>,
    released: bool,
}

impl HeadlessMap {
    fn new(basemap: &Basemap) -> Self {
        Self {
            basemap: basemap.clone(),
            center: basemap.center,
            zoom: basemap.zoom,
            tile_layer: None,
            markers: Vec::new(),
            clicks_subscribed: false,
            pending_clicks: VecDeque::new(),
            fits: Vec::new(),
            pans: Vec::new(),
            released: false,
        }
    }

    fn marker_mut(&mut self, id: HeadlessMarkerId) -> Option<&mut HeadlessMarker> {
        self.markers.iter_mut().find(|marker| marker.id == id)
    }

    fn clustered(&self) -> impl Iterator<Item = &HeadlessMarker> {
        self.markers.iter().filter(|marker| marker.clustered)
    }

    fn enqueue_click(&mut self, id: HeadlessMarkerId) -> bool {
        let hit = self.clicks_subscribed
            && !self.released
            && self.clustered().any(|marker| marker.id == id);
        if hit {
            self.pending_clicks.push_back(id);
        }
        hit
    }
}

#[derive(Debug, Default)]
struct HeadlessState {
    maps: Vec<HeadlessMap>,
    failure: Option<MountFailure>,
    releases: usize,
}

impl HeadlessState {
    fn latest(&self) -> Option<&HeadlessMap> {
        self.maps.last()
    }

    fn latest_mut(&mut self) -> Option<&mut HeadlessMap> {
        self.maps.last_mut()
    }
}

/// Shared-state mapping backend without a renderer.
///
/// # Examples
/// ```
/// use sighting_map_core::{Basemap, HeadlessBackend, MapBackend, MapSurface, lat_lng};
///
/// let backend = HeadlessBackend::new();
/// let mut surface = backend.create_surface(&Basemap::default())?;
/// surface.subscribe_cluster_clicks()?;
/// let marker = surface.create_marker(lat_lng(10.0, 20.0));
/// surface.add_to_cluster(&marker);
///
/// assert_eq!(backend.click_at(lat_lng(10.1, 20.1)), Some(marker));
/// assert_eq!(surface.next_cluster_click(), Some(marker));
/// # Ok::<(), sighting_map_core::SurfaceError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct HeadlessBackend {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessBackend {
    /// Create a backend whose surfaces always succeed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend whose surfaces fail at `stage`.
    #[must_use]
    pub fn failing(stage: MountFailure) -> Self {
        let backend = Self::new();
        backend.state.borrow_mut().failure = Some(stage);
        backend
    }

    /// Number of surfaces created so far.
    #[must_use]
    pub fn surfaces_created(&self) -> usize {
        self.state.borrow().maps.len()
    }

    /// Number of times any surface has been released.
    #[must_use]
    pub fn releases(&self) -> usize {
        self.state.borrow().releases
    }

    /// Whether the most recent surface is still live.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.state
            .borrow()
            .latest()
            .is_some_and(|map| !map.released)
    }

    /// Live markers of the most recent surface, in creation order.
    #[must_use]
    pub fn markers(&self) -> Vec<HeadlessMarker> {
        self.state
            .borrow()
            .latest()
            .map(|map| map.markers.clone())
            .unwrap_or_default()
    }

    /// Live marker with `id`.
    #[must_use]
    pub fn marker(&self, id: HeadlessMarkerId) -> Option<HeadlessMarker> {
        self.markers().into_iter().find(|marker| marker.id == id)
    }

    /// Markers currently showing the highlighted icon.
    #[must_use]
    pub fn highlighted(&self) -> Vec<HeadlessMarkerId> {
        self.markers()
            .into_iter()
            .filter(|marker| marker.icon == MarkerIcon::Highlighted)
            .map(|marker| marker.id)
            .collect()
    }

    /// Number of markers in the cluster layer.
    #[must_use]
    pub fn cluster_len(&self) -> usize {
        self.markers().iter().filter(|marker| marker.clustered).count()
    }

    /// Bounds passed to every fit, oldest first.
    #[must_use]
    pub fn fits(&self) -> Vec<Rect<f64>> {
        self.state
            .borrow()
            .latest()
            .map(|map| map.fits.clone())
            .unwrap_or_default()
    }

    /// Centres passed to every pan, oldest first.
    #[must_use]
    pub fn pans(&self) -> Vec<Coord<f64>> {
        self.state
            .borrow()
            .latest()
            .map(|map| map.pans.clone())
            .unwrap_or_default()
    }

    /// Current view centre.
    #[must_use]
    pub fn center(&self) -> Option<Coord<f64>> {
        self.state.borrow().latest().map(|map| map.center)
    }

    /// Attached tile layer.
    #[must_use]
    pub fn tile_layer(&self) -> Option<TileLayer> {
        self.state
            .borrow()
            .latest()
            .and_then(|map| map.tile_layer.clone())
    }

    /// Simulate a click on a clustered marker.
    ///
    /// Returns `false` when nobody listens for clicks or the marker is not in
    /// the cluster layer.
    #[must_use]
    pub fn click(&self, id: HeadlessMarkerId) -> bool {
        self.state
            .borrow_mut()
            .latest_mut()
            .is_some_and(|map| map.enqueue_click(id))
    }

    /// Simulate a click at `location`, hitting the nearest clustered marker
    /// within [`HIT_TOLERANCE_DEGREES`].
    #[must_use]
    pub fn click_at(&self, location: Coord<f64>) -> Option<HeadlessMarkerId> {
        let hit = self
            .state
            .borrow()
            .latest()
            .and_then(|map| hit_test(map, location))?;
        self.click(hit).then_some(hit)
    }

    /// Capture the most recent surface for inspection or serialization.
    #[must_use]
    pub fn snapshot(&self) -> Option<MapSnapshot> {
        self.state.borrow().latest().map(MapSnapshot::from)
    }
}

impl MapBackend for HeadlessBackend {
    type Surface = HeadlessSurface;

    fn create_surface(&self, basemap: &Basemap) -> Result<HeadlessSurface, SurfaceError> {
        let mut state = self.state.borrow_mut();
        if state.failure == Some(MountFailure::Container) {
            return Err(SurfaceError::Unavailable {
                reason: "headless container creation disabled".to_owned(),
            });
        }
        state.maps.push(HeadlessMap::new(basemap));
        Ok(HeadlessSurface {
            state: Rc::clone(&self.state),
            index: state.maps.len().saturating_sub(1),
            next_marker: 0,
        })
    }
}

/// Surface handed out by [`HeadlessBackend`].
#[derive(Debug)]
pub struct HeadlessSurface {
    state: Rc<RefCell<HeadlessState>>,
    index: usize,
    next_marker: u64,
}

impl HeadlessSurface {
    fn with_map<T>(&self, f: impl FnOnce(&mut HeadlessMap) -> T) -> Option<T> {
        let mut state = self.state.borrow_mut();
        state
            .maps
            .get_mut(self.index)
            .filter(|map| !map.released)
            .map(f)
    }

    fn failure(&self) -> Option<MountFailure> {
        self.state.borrow().failure
    }
}

impl MapSurface for HeadlessSurface {
    type Marker = HeadlessMarkerId;

    fn add_tile_layer(&mut self, tiles: &TileLayer) -> Result<(), SurfaceError> {
        if self.failure() == Some(MountFailure::TileLayer) {
            return Err(SurfaceError::TileLayer {
                url_template: tiles.url_template.clone(),
                reason: "headless tile layers disabled".to_owned(),
            });
        }
        self.with_map(|map| map.tile_layer = Some(tiles.clone()));
        Ok(())
    }

    fn subscribe_cluster_clicks(&mut self) -> Result<(), SurfaceError> {
        if self.failure() == Some(MountFailure::ClickSubscription) {
            return Err(SurfaceError::ClickSubscription {
                reason: "headless click events disabled".to_owned(),
            });
        }
        self.with_map(|map| map.clicks_subscribed = true);
        Ok(())
    }

    fn next_cluster_click(&mut self) -> Option<HeadlessMarkerId> {
        self.with_map(|map| map.pending_clicks.pop_front())
            .flatten()
    }

    fn create_marker(&mut self, location: Coord<f64>) -> HeadlessMarkerId {
        let id = HeadlessMarkerId(self.next_marker);
        self.next_marker = self.next_marker.saturating_add(1);
        self.with_map(|map| {
            map.markers.push(HeadlessMarker {
                id,
                location,
                icon: MarkerIcon::Default,
                clustered: false,
            });
        });
        id
    }

    fn add_to_cluster(&mut self, marker: &HeadlessMarkerId) {
        self.with_map(|map| {
            if let Some(entry) = map.marker_mut(*marker) {
                entry.clustered = true;
            }
        });
    }

    fn clear_cluster(&mut self) {
        self.with_map(|map| {
            map.markers.retain(|marker| !marker.clustered);
            map.pending_clicks.clear();
        });
    }

    fn cluster_bounds(&self) -> Option<Rect<f64>> {
        let state = self.state.borrow();
        let map = state.maps.get(self.index)?;
        let points: MultiPoint<f64> = map
            .clustered()
            .map(|marker| Point::from(marker.location))
            .collect();
        points.bounding_rect()
    }

    fn set_icon(&mut self, marker: &HeadlessMarkerId, icon: MarkerIcon) {
        self.with_map(|map| {
            if let Some(entry) = map.marker_mut(*marker) {
                entry.icon = icon;
            }
        });
    }

    fn fit_bounds(&mut self, bounds: Rect<f64>) {
        self.with_map(|map| {
            map.center = bounds.center();
            map.zoom = fit_zoom(bounds, map.basemap.max_zoom);
            map.fits.push(bounds);
        });
    }

    fn pan_to(&mut self, center: Coord<f64>) {
        self.with_map(|map| {
            map.center = center;
            map.pans.push(center);
        });
    }

    fn release(&mut self) {
        let mut state = self.state.borrow_mut();
        let newly_released = state
            .maps
            .get_mut(self.index)
            .is_some_and(|map| !std::mem::replace(&mut map.released, true));
        if newly_released {
            state.releases = state.releases.saturating_add(1);
        }
    }
}

struct ClusterPoint {
    id: HeadlessMarkerId,
    location: Coord<f64>,
}

impl RTreeObject for ClusterPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.x, self.location.y])
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "hit testing measures offsets between coordinates"
)]
fn hit_test(map: &HeadlessMap, location: Coord<f64>) -> Option<HeadlessMarkerId> {
    let index = RTree::bulk_load(
        map.clustered()
            .map(|marker| ClusterPoint {
                id: marker.id,
                location: marker.location,
            })
            .collect(),
    );
    let tolerance = HIT_TOLERANCE_DEGREES;
    let envelope = AABB::from_corners(
        [location.x - tolerance, location.y - tolerance],
        [location.x + tolerance, location.y + tolerance],
    );
    index
        .locate_in_envelope_intersecting(&envelope)
        .map(|candidate| {
            let dx = candidate.location.x - location.x;
            let dy = candidate.location.y - location.y;
            (candidate.id, dx * dx + dy * dy)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
        .map(|(id, _)| id)
}

/// Deepest zoom, capped at `max_zoom`, whose view still spans `bounds`.
///
/// Each zoom level halves the visible span in both directions.
#[expect(
    clippy::float_arithmetic,
    reason = "visible span halves with every zoom level"
)]
fn fit_zoom(bounds: Rect<f64>, max_zoom: u8) -> u8 {
    let mut zoom = 0;
    let mut width = WORLD_WIDTH_DEGREES;
    let mut height = WORLD_HEIGHT_DEGREES;
    while zoom < max_zoom && bounds.width() <= width / 2.0 && bounds.height() <= height / 2.0 {
        width /= 2.0;
        height /= 2.0;
        zoom = zoom.saturating_add(1);
    }
    zoom
}

/// Latitude/longitude pair in the order map users read them.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LatLng {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl From<Coord<f64>> for LatLng {
    fn from(coord: Coord<f64>) -> Self {
        Self {
            latitude: coord.y,
            longitude: coord.x,
        }
    }
}

/// Axis-aligned bounds in compass terms.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BoundsSnapshot {
    /// Southern latitude.
    pub south: f64,
    /// Western longitude.
    pub west: f64,
    /// Northern latitude.
    pub north: f64,
    /// Eastern longitude.
    pub east: f64,
}

impl From<Rect<f64>> for BoundsSnapshot {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            south: rect.min().y,
            west: rect.min().x,
            north: rect.max().y,
            east: rect.max().x,
        }
    }
}

/// One marker as captured by [`MapSnapshot`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MarkerSnapshot {
    /// Marker identifier.
    pub id: HeadlessMarkerId,
    /// Marker position.
    pub position: LatLng,
    /// Current appearance.
    pub icon: MarkerIcon,
    /// Image shown for the current appearance.
    pub icon_url: String,
    /// Whether the marker sits in the cluster layer.
    pub clustered: bool,
}

/// Serializable picture of a headless surface.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MapSnapshot {
    /// Basemap preset in use.
    pub basemap: BasemapKind,
    /// Current view centre.
    pub center: LatLng,
    /// Current zoom level.
    pub zoom: u8,
    /// Attached tile layer template.
    pub tile_url: Option<String>,
    /// Live markers in creation order.
    pub markers: Vec<MarkerSnapshot>,
    /// Every fitted bounds, oldest first.
    pub fits: Vec<BoundsSnapshot>,
    /// Every pan target, oldest first.
    pub pans: Vec<LatLng>,
    /// Whether the surface has been released.
    pub released: bool,
}

impl From<&HeadlessMap> for MapSnapshot {
    fn from(map: &HeadlessMap) -> Self {
        Self {
            basemap: map.basemap.kind,
            center: map.center.into(),
            zoom: map.zoom,
            tile_url: map
                .tile_layer
                .as_ref()
                .map(|tiles| tiles.url_template.clone()),
            markers: map
                .markers
                .iter()
                .map(|marker| MarkerSnapshot {
                    id: marker.id,
                    position: marker.location.into(),
                    icon: marker.icon,
                    icon_url: map.basemap.icon(marker.icon).icon_url.clone(),
                    clustered: marker.clustered,
                })
                .collect(),
            fits: map.fits.iter().copied().map(BoundsSnapshot::from).collect(),
            pans: map.pans.iter().copied().map(LatLng::from).collect(),
            released: map.released,
        }
    }
}
