//! Deferred bounds fitting and immediate panning.
//!
//! Clustering renderers may not have measured their layout by the time
//! markers are added, so fitting the view to them right away can use stale
//! sizes. Fits are therefore queued with a fixed delay and run when the host
//! polls. A queued fit is never cancelled; one that finds the cluster layer
//! empty does nothing.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use geo::Coord;
use log::debug;

use crate::MapSurface;

/// Delay between a content change and the viewport fit it triggers.
pub const DEFAULT_FIT_DELAY: Duration = Duration::from_millis(200);

/// Queue of pending viewport fits.
///
/// # Examples
/// ```
/// use std::time::{Duration, Instant};
/// use sighting_map_core::ViewportController;
///
/// let mut viewport = ViewportController::new(Duration::from_millis(200));
/// let start = Instant::now();
/// viewport.schedule_fit(start);
/// assert_eq!(viewport.pending_fits(), 1);
/// assert!(viewport.next_due().is_some_and(|due| due > start));
/// ```
#[derive(Debug, Clone)]
pub struct ViewportController {
    delay: Duration,
    pending: VecDeque<Instant>,
}

impl ViewportController {
    /// Controller whose fits run `delay` after being scheduled.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: VecDeque::new(),
        }
    }

    /// Configured fit delay.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Queue a fit due `delay` after `now`.
    pub fn schedule_fit(&mut self, now: Instant) {
        let due = now.checked_add(self.delay).unwrap_or(now);
        self.pending.push_back(due);
    }

    /// Number of queued fits.
    #[must_use]
    pub fn pending_fits(&self) -> usize {
        self.pending.len()
    }

    /// Instant the oldest queued fit becomes due.
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.front().copied()
    }

    /// Run every fit due at or before `now`, returning how many ran.
    ///
    /// Each fit adjusts `surface` to the bounds of its cluster layer, or does
    /// nothing if the layer is empty by then.
    pub fn run_due<S: MapSurface>(&mut self, now: Instant, surface: &mut S) -> usize {
        let mut fired = 0_usize;
        while self.pending.front().is_some_and(|due| *due <= now) {
            self.pending.pop_front();
            fired = fired.saturating_add(1);
            Self::fit(surface);
        }
        fired
    }

    /// Drop every queued fit.
    pub fn cancel_pending(&mut self) {
        if !self.pending.is_empty() {
            debug!("dropping {} pending viewport fits", self.pending.len());
        }
        self.pending.clear();
    }

    /// Pan `surface` to `center` immediately.
    pub fn pan_to<S: MapSurface>(surface: &mut S, center: Coord<f64>) {
        surface.pan_to(center);
    }

    fn fit<S: MapSurface>(surface: &mut S) {
        match surface.cluster_bounds() {
            Some(bounds) => surface.fit_bounds(bounds),
            None => debug!("skipping viewport fit: cluster layer is empty"),
        }
    }
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(DEFAULT_FIT_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Basemap, HeadlessBackend, HeadlessSurface, MapBackend, lat_lng};
    use rstest::{fixture, rstest};

    #[fixture]
    fn backend() -> HeadlessBackend {
        HeadlessBackend::new()
    }

    fn surface_with_markers(backend: &HeadlessBackend, count: u8) -> HeadlessSurface {
        let mut surface = backend
            .create_surface(&Basemap::openstreetmap())
            .expect("surface");
        for n in 0..count {
            let marker = surface.create_marker(lat_lng(f64::from(n), f64::from(n)));
            surface.add_to_cluster(&marker);
        }
        surface
    }

    #[rstest]
    fn fit_waits_for_delay(backend: HeadlessBackend) {
        let mut surface = surface_with_markers(&backend, 2);
        let mut viewport = ViewportController::default();
        let start = Instant::now();
        viewport.schedule_fit(start);

        let early = start
            .checked_add(Duration::from_millis(199))
            .expect("instant");
        assert_eq!(viewport.run_due(early, &mut surface), 0);
        assert!(backend.fits().is_empty());

        let due = start.checked_add(DEFAULT_FIT_DELAY).expect("instant");
        assert_eq!(viewport.run_due(due, &mut surface), 1);
        assert_eq!(viewport.pending_fits(), 0);

        let fits = backend.fits();
        assert_eq!(fits.len(), 1);
        assert_eq!(fits[0].min(), lat_lng(0.0, 0.0));
        assert_eq!(fits[0].max(), lat_lng(1.0, 1.0));
    }

    #[rstest]
    fn superseded_fits_all_run(backend: HeadlessBackend) {
        let mut surface = surface_with_markers(&backend, 1);
        let mut viewport = ViewportController::new(Duration::ZERO);
        let now = Instant::now();
        viewport.schedule_fit(now);
        viewport.schedule_fit(now);

        assert_eq!(viewport.run_due(now, &mut surface), 2);
        assert_eq!(backend.fits().len(), 2);
    }

    #[rstest]
    fn fit_on_empty_layer_is_a_no_op(backend: HeadlessBackend) {
        let mut surface = surface_with_markers(&backend, 0);
        let mut viewport = ViewportController::new(Duration::ZERO);
        let now = Instant::now();
        viewport.schedule_fit(now);

        assert_eq!(viewport.run_due(now, &mut surface), 1);
        assert!(backend.fits().is_empty());
    }

    #[rstest]
    fn cancel_drops_queue() {
        let mut viewport = ViewportController::default();
        viewport.schedule_fit(Instant::now());
        viewport.cancel_pending();

        assert_eq!(viewport.pending_fits(), 0);
        assert_eq!(viewport.next_due(), None);
    }

    #[rstest]
    fn pan_is_immediate(backend: HeadlessBackend) {
        let mut surface = surface_with_markers(&backend, 0);
        ViewportController::pan_to(&mut surface, lat_lng(30.0, 40.0));

        assert_eq!(backend.pans(), vec![lat_lng(30.0, 40.0)]);
        assert_eq!(backend.center(), Some(lat_lng(30.0, 40.0)));
    }
}
