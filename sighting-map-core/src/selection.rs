//! The selected entity and the marker currently styled as selected.
//!
//! Selection is domain state; the highlighted marker is a rendering side
//! effect. They are tracked separately because a selection may name an
//! entity that has no marker yet.

use std::rc::Rc;

use crate::{Entity, MapSurface, MarkerIcon};

/// Selected entity plus highlighted marker handle.
#[derive(Debug)]
pub struct SelectionState<E, H> {
    selected: Option<Rc<E>>,
    highlighted: Option<H>,
}

impl<E, H> SelectionState<E, H>
where
    E: Entity,
    H: Clone + Eq,
{
    /// Nothing selected, nothing highlighted.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            selected: None,
            highlighted: None,
        }
    }

    /// Currently selected entity.
    pub const fn selected(&self) -> Option<&Rc<E>> {
        self.selected.as_ref()
    }

    /// Identity of the selected entity.
    pub fn selected_id(&self) -> Option<E::Id> {
        self.selected.as_ref().and_then(|entity| entity.id())
    }

    /// Whether `id` names the selected entity.
    pub fn is_selected(&self, id: &E::Id) -> bool {
        self.selected_id().as_ref() == Some(id)
    }

    /// Replace the selection without touching any marker.
    pub fn select(&mut self, entity: Option<Rc<E>>) {
        self.selected = entity;
    }

    /// Marker currently showing the highlighted icon.
    pub const fn highlighted(&self) -> Option<&H> {
        self.highlighted.as_ref()
    }

    /// Move the highlight to `target`.
    ///
    /// The previous marker, if different, is restored to the default icon
    /// first. Highlighting the current marker again changes nothing visible.
    pub fn highlight<S>(&mut self, surface: &mut S, target: &H)
    where
        S: MapSurface<Marker = H>,
    {
        if let Some(stale) = self
            .highlighted
            .as_ref()
            .filter(|&current| current != target)
        {
            surface.set_icon(stale, MarkerIcon::Default);
        }
        surface.set_icon(target, MarkerIcon::Highlighted);
        self.highlighted = Some(target.clone());
    }

    /// Restore the highlighted marker, if any, to the default icon.
    pub fn clear_highlight<S>(&mut self, surface: &mut S)
    where
        S: MapSurface<Marker = H>,
    {
        if let Some(previous) = self.highlighted.take() {
            surface.set_icon(&previous, MarkerIcon::Default);
        }
    }

    /// Drop the highlighted handle without restyling it, for markers that
    /// have been destroyed.
    pub fn forget_highlight(&mut self) {
        self.highlighted = None;
    }
}

impl<E, H> Default for SelectionState<E, H>
where
    E: Entity,
    H: Clone + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sighting;
    use crate::{
        Basemap, HeadlessBackend, HeadlessMarkerId, HeadlessSurface, MapBackend, Sighting,
    };
    use rstest::{fixture, rstest};

    struct Harness {
        backend: HeadlessBackend,
        surface: HeadlessSurface,
        markers: Vec<HeadlessMarkerId>,
        state: SelectionState<Sighting, HeadlessMarkerId>,
    }

    #[fixture]
    fn harness() -> Harness {
        let backend = HeadlessBackend::new();
        let mut surface = backend
            .create_surface(&Basemap::openstreetmap())
            .expect("surface");
        let markers = (0_u8..3)
            .map(|n| surface.create_marker(crate::lat_lng(f64::from(n), 0.0)))
            .collect();
        Harness {
            backend,
            surface,
            markers,
            state: SelectionState::new(),
        }
    }

    fn icon(harness: &Harness, id: HeadlessMarkerId) -> MarkerIcon {
        harness.backend.marker(id).expect("live marker").icon
    }

    #[rstest]
    fn highlight_moves_between_markers(mut harness: Harness) {
        let (first, second) = (harness.markers[0], harness.markers[1]);

        harness.state.highlight(&mut harness.surface, &first);
        harness.state.highlight(&mut harness.surface, &second);

        assert_eq!(icon(&harness, first), MarkerIcon::Default);
        assert_eq!(icon(&harness, second), MarkerIcon::Highlighted);
        assert_eq!(harness.state.highlighted(), Some(&second));
        assert_eq!(harness.backend.highlighted(), vec![second]);
    }

    #[rstest]
    fn highlighting_twice_is_idempotent(mut harness: Harness) {
        let target = harness.markers[2];
        harness.state.highlight(&mut harness.surface, &target);
        let once = harness.backend.markers();

        harness.state.highlight(&mut harness.surface, &target);

        assert_eq!(harness.backend.markers(), once);
        assert_eq!(harness.state.highlighted(), Some(&target));
    }

    #[rstest]
    fn clear_restores_default_icon(mut harness: Harness) {
        let target = harness.markers[0];
        harness.state.highlight(&mut harness.surface, &target);
        harness.state.clear_highlight(&mut harness.surface);

        assert_eq!(icon(&harness, target), MarkerIcon::Default);
        assert_eq!(harness.state.highlighted(), None);
    }

    #[rstest]
    fn forget_leaves_icons_alone(mut harness: Harness) {
        let target = harness.markers[1];
        harness.state.highlight(&mut harness.surface, &target);
        harness.state.forget_highlight();

        assert_eq!(icon(&harness, target), MarkerIcon::Highlighted);
        assert_eq!(harness.state.highlighted(), None);
    }

    #[rstest]
    fn selection_compares_by_identity(mut harness: Harness) {
        harness.state.select(Some(Rc::new(sighting(2, 0.0, 0.0))));

        assert!(harness.state.is_selected(&2));
        assert!(!harness.state.is_selected(&3));

        harness.state.select(Some(Rc::new(Sighting::default())));
        assert_eq!(harness.state.selected_id(), None);
        assert!(!harness.state.is_selected(&2));
    }
}
