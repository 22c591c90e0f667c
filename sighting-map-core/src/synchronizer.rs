//! Keeps map markers, the highlighted marker and the viewport in step with
//! the entity list and the selection.
//!
//! The synchronizer is driven through explicit setters rather than observers:
//! [`MapSynchronizer::set_content`] rebuilds every marker,
//! [`MapSynchronizer::set_selection`] moves the highlight and pans, and
//! [`MapSynchronizer::click_marker`] is the one path on which the
//! synchronizer itself writes the selection. Everything runs on the caller's
//! thread; the only deferred work is the viewport fit, which the host fires
//! through [`MapSynchronizer::run_pending`].

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use geo::Coord;
use log::debug;

use crate::{
    Basemap, Clock, ContentError, DEFAULT_FIT_DELAY, Entity, MapBackend, MapSurface, Marker,
    MarkerCache, MountError, SelectionState, SurfaceError, SystemClock, ViewportController,
    is_valid_location,
};

type SurfaceOf<B> = <B as MapBackend>::Surface;
type HandleOf<B> = <SurfaceOf<B> as MapSurface>::Marker;
type SelectionListener<E> = Box<dyn FnMut(&Rc<E>)>;

/// Settings for a [`MapSynchronizer`].
#[derive(Debug, Clone, PartialEq)]
pub struct SynchronizerConfig {
    /// Basemap the surface is created with.
    pub basemap: Basemap,
    /// Delay before a content change fits the viewport.
    pub fit_delay: Duration,
}

impl Default for SynchronizerConfig {
    fn default() -> Self {
        Self {
            basemap: Basemap::openstreetmap(),
            fit_delay: DEFAULT_FIT_DELAY,
        }
    }
}

/// An entity accepted into the content list, with the fields the map reads.
///
/// The content list holds the only strong references the synchronizer keeps,
/// so a cached marker's back-reference resolves for as long as it is cached.
#[derive(Debug)]
struct Placed<E: Entity> {
    entity: Rc<E>,
    id: E::Id,
    location: Coord<f64>,
}

/// Synchronizes a marker map with a list of entities and a selection.
///
/// # Examples
/// ```
/// use std::rc::Rc;
/// use std::time::Duration;
/// use sighting_map_core::{
///     HeadlessBackend, ManualClock, MapSynchronizer, Sighting, SynchronizerConfig, lat_lng,
/// };
///
/// let backend = HeadlessBackend::new();
/// let clock = ManualClock::new();
/// let mut map = MapSynchronizer::with_clock(
///     backend.clone(),
///     clock.clone(),
///     SynchronizerConfig::default(),
/// );
/// map.mount()?;
///
/// let heron = Rc::new(Sighting::new(1, lat_lng(10.0, 20.0), "Heron"));
/// let crane = Rc::new(Sighting::new(2, lat_lng(30.0, 40.0), "Crane"));
/// map.set_content(vec![Rc::clone(&heron), Rc::clone(&crane)])?;
///
/// clock.advance(Duration::from_millis(200));
/// assert_eq!(map.run_pending(), 1);
/// assert_eq!(backend.fits().len(), 1);
///
/// map.set_selection(Some(crane));
/// assert_eq!(map.highlighted_id(), Some(&2));
/// assert_eq!(backend.pans(), vec![lat_lng(30.0, 40.0)]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct MapSynchronizer<E, B, C = SystemClock>
where
    E: Entity,
    B: MapBackend,
    C: Clock,
{
    backend: B,
    clock: C,
    basemap: Basemap,
    surface: Option<SurfaceOf<B>>,
    content: Vec<Placed<E>>,
    cache: MarkerCache<E::Id, HandleOf<B>, E>,
    selection: SelectionState<E, HandleOf<B>>,
    viewport: ViewportController,
    listener: Option<SelectionListener<E>>,
}

impl<E, B> MapSynchronizer<E, B, SystemClock>
where
    E: Entity,
    B: MapBackend,
{
    /// Create an unmounted synchronizer driven by the wall clock.
    #[must_use]
    pub fn new(backend: B, config: SynchronizerConfig) -> Self {
        Self::with_clock(backend, SystemClock, config)
    }
}

impl<E, B, C> MapSynchronizer<E, B, C>
where
    E: Entity,
    B: MapBackend,
    C: Clock,
{
    /// Create an unmounted synchronizer driven by `clock`.
    #[must_use]
    pub fn with_clock(backend: B, clock: C, config: SynchronizerConfig) -> Self {
        Self {
            backend,
            clock,
            basemap: config.basemap,
            surface: None,
            content: Vec::new(),
            cache: MarkerCache::new(),
            selection: SelectionState::new(),
            viewport: ViewportController::new(config.fit_delay),
            listener: None,
        }
    }

    /// Acquire a map surface and render any content assigned so far.
    ///
    /// A surface that fails part-way through setup is released before the
    /// error is returned, so a failed mount leaves nothing to clean up.
    ///
    /// # Errors
    ///
    /// Returns [`MountError::AlreadyMounted`] when a surface is already live,
    /// or [`MountError::Surface`] when the backend cannot create the surface,
    /// attach its tile layer or subscribe to cluster clicks.
    pub fn mount(&mut self) -> Result<(), MountError> {
        if self.surface.is_some() {
            return Err(MountError::AlreadyMounted);
        }
        let mut surface = self.backend.create_surface(&self.basemap)?;
        if let Err(source) = prepare_surface(&mut surface, &self.basemap) {
            surface.release();
            return Err(MountError::Surface(source));
        }
        debug!("mounted {} map", self.basemap.kind);
        self.surface = Some(surface);
        if !self.content.is_empty() {
            self.rebuild();
        }
        Ok(())
    }

    /// Release the map surface.
    ///
    /// Safe to call when never mounted, after a failed mount, or repeatedly.
    /// Pending viewport fits are dropped; content and selection are kept for
    /// the next mount.
    pub fn unmount(&mut self) {
        let Some(mut surface) = self.surface.take() else {
            return;
        };
        self.viewport.cancel_pending();
        self.cache.clear();
        self.selection.forget_highlight();
        surface.release();
        debug!("released {} map", self.basemap.kind);
    }

    /// Replace the entity list and rebuild every marker.
    ///
    /// The whole list is validated first; on error nothing changes. While
    /// unmounted the list is stored and rendered on the next mount.
    ///
    /// # Errors
    ///
    /// Returns a [`ContentError`] naming the first entity without an
    /// identity, without a usable location, or repeating an earlier identity.
    pub fn set_content(&mut self, content: Vec<Rc<E>>) -> Result<(), ContentError> {
        self.content = place_content(content)?;
        if self.surface.is_some() {
            self.rebuild();
        } else {
            debug!("storing {} entities until the map is mounted", self.content.len());
        }
        Ok(())
    }

    /// Replace the selection from outside, highlighting and panning to its
    /// marker when one exists.
    ///
    /// A selection whose marker does not exist yet is remembered and resolved
    /// by the next rebuild that renders it. Clearing the selection restores
    /// the highlighted marker to the default icon.
    pub fn set_selection(&mut self, selection: Option<Rc<E>>) {
        self.selection.select(selection);
        let Some(surface) = self.surface.as_mut() else {
            debug!("selection stored until the map is mounted");
            return;
        };
        if self.selection.selected().is_none() {
            self.selection.clear_highlight(surface);
            return;
        }
        let Some(id) = self.selection.selected_id() else {
            debug!("selected entity has no identity");
            return;
        };
        let Some(marker) = self.cache.get(&id) else {
            debug!("selection {id:?} has no marker yet");
            return;
        };
        self.selection.highlight(surface, marker.handle());
        ViewportController::pan_to(surface, marker.location());
    }

    /// Handle a click on a clustered marker.
    ///
    /// Highlights the marker, makes its entity the selection and notifies the
    /// selection listener. Returns the newly selected entity, or `None` for
    /// clicks on markers that a rebuild has already discarded.
    pub fn click_marker(&mut self, handle: &HandleOf<B>) -> Option<Rc<E>> {
        let surface = self.surface.as_mut()?;
        let Some(marker) = self.cache.marker_for(handle) else {
            debug!("ignoring click on discarded marker {handle:?}");
            return None;
        };
        let entity = marker.entity()?;
        self.selection.highlight(surface, marker.handle());
        self.selection.select(Some(Rc::clone(&entity)));
        if let Some(listener) = self.listener.as_mut() {
            listener(&entity);
        }
        Some(entity)
    }

    /// Drain the surface's click stream, handling each click in order.
    ///
    /// Returns the entity selected by the last click that resolved.
    pub fn dispatch_clicks(&mut self) -> Option<Rc<E>> {
        let mut latest = None;
        while let Some(handle) = self
            .surface
            .as_mut()
            .and_then(|surface| surface.next_cluster_click())
        {
            latest = self.click_marker(&handle).or(latest);
        }
        latest
    }

    /// Run viewport fits whose delay has elapsed, returning how many ran.
    pub fn run_pending(&mut self) -> usize {
        let now = self.clock.now();
        self.surface
            .as_mut()
            .map_or(0, |surface| self.viewport.run_due(now, surface))
    }

    /// Register the sink notified whenever a click changes the selection.
    ///
    /// Replaces any previously registered listener.
    pub fn on_selection_change(&mut self, listener: impl FnMut(&Rc<E>) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Current entity list in assignment order.
    #[must_use]
    pub fn content(&self) -> impl Iterator<Item = &Rc<E>> {
        self.content.iter().map(|placed| &placed.entity)
    }

    /// Current selection.
    #[must_use]
    pub const fn selection(&self) -> Option<&Rc<E>> {
        self.selection.selected()
    }

    /// Handle of the highlighted marker.
    #[must_use]
    pub const fn highlighted(&self) -> Option<&HandleOf<B>> {
        self.selection.highlighted()
    }

    /// Identity of the entity whose marker is highlighted.
    #[must_use]
    pub fn highlighted_id(&self) -> Option<&E::Id> {
        self.highlighted()
            .and_then(|handle| self.cache.key_for(handle))
    }

    /// Identities with a cached marker, in arbitrary order.
    #[must_use]
    pub fn cached_ids(&self) -> impl Iterator<Item = &E::Id> {
        self.cache.keys()
    }

    /// Cached marker for `id`.
    #[must_use]
    pub fn cached_marker(&self, id: &E::Id) -> Option<&Marker<HandleOf<B>, E>> {
        self.cache.get(id)
    }

    /// Number of cached markers.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Whether a surface is live.
    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    /// Number of viewport fits waiting for their delay.
    #[must_use]
    pub fn pending_fits(&self) -> usize {
        self.viewport.pending_fits()
    }

    /// The live surface.
    #[must_use]
    pub const fn surface(&self) -> Option<&SurfaceOf<B>> {
        self.surface.as_ref()
    }

    /// Basemap the surface is created with.
    #[must_use]
    pub const fn basemap(&self) -> &Basemap {
        &self.basemap
    }

    /// Delay between a content change and its viewport fit.
    #[must_use]
    pub const fn fit_delay(&self) -> Duration {
        self.viewport.delay()
    }

    fn rebuild(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        self.cache.clear();
        surface.clear_cluster();
        self.selection.forget_highlight();

        for placed in &self.content {
            let handle = surface.create_marker(placed.location);
            if self.selection.is_selected(&placed.id) {
                self.selection.highlight(surface, &handle);
            }
            self.cache.insert(
                placed.id.clone(),
                Marker::new(handle, placed.location, &placed.entity),
            );
        }
        for placed in &self.content {
            if let Some(marker) = self.cache.get(&placed.id) {
                surface.add_to_cluster(marker.handle());
            }
        }

        self.viewport.schedule_fit(self.clock.now());
        debug!("rebuilt {} markers", self.cache.len());
    }
}

impl<E, B, C> fmt::Debug for MapSynchronizer<E, B, C>
where
    E: Entity,
    B: MapBackend,
    C: Clock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapSynchronizer")
            .field("basemap", &self.basemap.kind)
            .field("mounted", &self.surface.is_some())
            .field("content", &self.content.len())
            .field("cached", &self.cache.len())
            .field("highlighted", &self.selection.highlighted())
            .field("pending_fits", &self.viewport.pending_fits())
            .finish_non_exhaustive()
    }
}

impl<E, B, C> Drop for MapSynchronizer<E, B, C>
where
    E: Entity,
    B: MapBackend,
    C: Clock,
{
    fn drop(&mut self) {
        self.unmount();
    }
}

fn prepare_surface<S: MapSurface>(surface: &mut S, basemap: &Basemap) -> Result<(), SurfaceError> {
    if let Some(tiles) = &basemap.tiles {
        surface.add_tile_layer(tiles)?;
    }
    surface.subscribe_cluster_clicks()
}

fn place_content<E: Entity>(content: Vec<Rc<E>>) -> Result<Vec<Placed<E>>, ContentError> {
    let mut seen = HashSet::with_capacity(content.len());
    content
        .into_iter()
        .enumerate()
        .map(|(index, entity)| {
            let id = entity.id().ok_or(ContentError::MissingIdentity { index })?;
            let location = entity
                .location()
                .ok_or(ContentError::MissingLocation { index })?;
            if !is_valid_location(location) {
                return Err(ContentError::InvalidLocation {
                    index,
                    latitude: location.y,
                    longitude: location.x,
                });
            }
            if !seen.insert(id.clone()) {
                return Err(ContentError::DuplicateIdentity {
                    index,
                    id: format!("{id:?}"),
                });
            }
            Ok(Placed {
                entity,
                id,
                location,
            })
        })
        .collect()
}
