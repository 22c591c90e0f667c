//! Builders and a ready-made harness shared by unit and behaviour tests.

use std::rc::Rc;

use crate::{
    HeadlessBackend, ManualClock, MapSynchronizer, MarkerIcon, MountError, Sighting,
    SynchronizerConfig, lat_lng,
};

/// Sighting with `id` at (`latitude`, `longitude`) and a placeholder species.
#[must_use]
pub fn sighting(id: u64, latitude: f64, longitude: f64) -> Sighting {
    Sighting::new(id, lat_lng(latitude, longitude), format!("species-{id}"))
}

/// Wrap each sighting in an `Rc`, ready for
/// [`MapSynchronizer::set_content`].
#[must_use]
pub fn shared<I>(sightings: I) -> Vec<Rc<Sighting>>
where
    I: IntoIterator<Item = Sighting>,
{
    sightings.into_iter().map(Rc::new).collect()
}

/// Synchronizer over a headless backend and a manual clock.
pub type HeadlessSynchronizer = MapSynchronizer<Sighting, HeadlessBackend, ManualClock>;

/// A headless synchronizer plus the handles needed to drive and inspect it.
#[derive(Debug)]
pub struct HeadlessHarness {
    /// Inspection handle sharing state with the synchronizer's backend.
    pub backend: HeadlessBackend,
    /// Clock driving deferred fits.
    pub clock: ManualClock,
    /// Synchronizer under test.
    pub map: HeadlessSynchronizer,
}

impl HeadlessHarness {
    /// Unmounted harness using `backend` and the default configuration.
    #[must_use]
    pub fn unmounted(backend: HeadlessBackend) -> Self {
        Self::with_config(backend, SynchronizerConfig::default())
    }

    /// Unmounted harness using `backend` and `config`.
    #[must_use]
    pub fn with_config(backend: HeadlessBackend, config: SynchronizerConfig) -> Self {
        let clock = ManualClock::new();
        let map = MapSynchronizer::with_clock(backend.clone(), clock.clone(), config);
        Self {
            backend,
            clock,
            map,
        }
    }

    /// Mounted harness over a fresh backend.
    ///
    /// # Errors
    ///
    /// Propagates the [`MountError`] from [`MapSynchronizer::mount`].
    pub fn mounted() -> Result<Self, MountError> {
        let mut harness = Self::unmounted(HeadlessBackend::new());
        harness.map.mount()?;
        Ok(harness)
    }

    /// Advance the clock past the fit delay and run whatever fell due.
    pub fn settle(&mut self) -> usize {
        self.clock.advance(self.map.fit_delay());
        self.map.run_pending()
    }

    /// Icon currently shown by the marker cached for `id`.
    #[must_use]
    pub fn icon_of(&self, id: u64) -> Option<MarkerIcon> {
        let handle = *self.map.cached_marker(&id)?.handle();
        self.backend.marker(handle).map(|marker| marker.icon)
    }

    /// Identities whose markers show the highlighted icon, ascending.
    #[must_use]
    pub fn highlighted_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .map
            .cached_ids()
            .copied()
            .filter(|id| self.icon_of(*id) == Some(MarkerIcon::Highlighted))
            .collect();
        ids.sort_unstable();
        ids
    }
}
