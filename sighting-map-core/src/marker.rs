//! Rendered markers and the identity-keyed cache that owns them.

use std::collections::HashMap;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use geo::Coord;

/// A rendered marker together with the entity it was created from.
///
/// The back-reference is weak: a marker never keeps its entity alive and is
/// only used to resolve clicks back to domain data. Whoever owns the content
/// keeps the entity alive for as long as the marker is meaningful.
#[derive(Debug)]
pub struct Marker<H, E> {
    handle: H,
    location: Coord<f64>,
    entity: Weak<E>,
}

impl<H, E> Marker<H, E> {
    /// Wrap a surface handle created at `location` for `entity`.
    pub fn new(handle: H, location: Coord<f64>, entity: &Rc<E>) -> Self {
        Self {
            handle,
            location,
            entity: Rc::downgrade(entity),
        }
    }

    /// Surface handle.
    pub const fn handle(&self) -> &H {
        &self.handle
    }

    /// Position the marker was placed at.
    pub const fn location(&self) -> Coord<f64> {
        self.location
    }

    /// Source entity, if its owner still holds it.
    pub fn entity(&self) -> Option<Rc<E>> {
        self.entity.upgrade()
    }
}

/// Markers keyed by entity identity, with a reverse index from handles.
///
/// The cache is rebuilt wholesale on every content change, so it never holds
/// markers from two different content assignments.
///
/// # Examples
/// ```
/// use std::rc::Rc;
/// use sighting_map_core::{Marker, MarkerCache, lat_lng};
///
/// let entity = Rc::new("heron");
/// let mut cache: MarkerCache<u64, u32, &str> = MarkerCache::new();
/// cache.insert(7, Marker::new(100, lat_lng(1.0, 2.0), &entity));
///
/// assert_eq!(cache.key_for(&100), Some(&7));
/// assert_eq!(cache.get(&7).and_then(|m| m.entity()).as_deref(), Some(&"heron"));
/// ```
#[derive(Debug)]
pub struct MarkerCache<K, H, E> {
    markers: HashMap<K, Marker<H, E>>,
    keys_by_handle: HashMap<H, K>,
}

impl<K, H, E> MarkerCache<K, H, E>
where
    K: Clone + Eq + Hash,
    H: Clone + Eq + Hash,
{
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            markers: HashMap::new(),
            keys_by_handle: HashMap::new(),
        }
    }

    /// Drop every marker.
    pub fn clear(&mut self) {
        self.markers.clear();
        self.keys_by_handle.clear();
    }

    /// Cache `marker` under `key`, replacing any marker already stored there.
    pub fn insert(&mut self, key: K, marker: Marker<H, E>) {
        let handle = marker.handle().clone();
        if let Some(previous) = self.markers.insert(key.clone(), marker) {
            self.keys_by_handle.remove(previous.handle());
        }
        self.keys_by_handle.insert(handle, key);
    }

    /// Marker cached for `key`.
    pub fn get(&self, key: &K) -> Option<&Marker<H, E>> {
        self.markers.get(key)
    }

    /// Key of the marker with `handle`.
    pub fn key_for(&self, handle: &H) -> Option<&K> {
        self.keys_by_handle.get(handle)
    }

    /// Marker with `handle`.
    pub fn marker_for(&self, handle: &H) -> Option<&Marker<H, E>> {
        self.key_for(handle).and_then(|key| self.markers.get(key))
    }

    /// Whether a marker is cached for `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.markers.contains_key(key)
    }

    /// Cached identities in arbitrary order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.markers.keys()
    }

    /// Number of cached markers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl<K, H, E> Default for MarkerCache<K, H, E>
where
    K: Clone + Eq + Hash,
    H: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lat_lng;
    use rstest::{fixture, rstest};

    type Cache = MarkerCache<u64, u32, &'static str>;

    #[fixture]
    fn entities() -> Vec<Rc<&'static str>> {
        vec![Rc::new("otter"), Rc::new("beaver")]
    }

    #[rstest]
    fn replacing_a_key_forgets_the_old_handle(entities: Vec<Rc<&'static str>>) {
        let mut cache = Cache::new();
        cache.insert(1, Marker::new(10, lat_lng(0.0, 0.0), &entities[0]));
        cache.insert(1, Marker::new(11, lat_lng(1.0, 1.0), &entities[1]));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.key_for(&10), None);
        assert_eq!(cache.key_for(&11), Some(&1));
    }

    #[rstest]
    fn clear_drops_markers_and_reverse_index(entities: Vec<Rc<&'static str>>) {
        let mut cache = Cache::new();
        cache.insert(1, Marker::new(10, lat_lng(0.0, 0.0), &entities[0]));
        cache.insert(2, Marker::new(20, lat_lng(0.0, 0.0), &entities[1]));
        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.marker_for(&10).is_none());
        assert!(!cache.contains(&2));
    }

    #[rstest]
    fn back_reference_does_not_keep_entity_alive() {
        let entity = Rc::new("stoat");
        let marker: Marker<u32, &str> = Marker::new(1, lat_lng(0.0, 0.0), &entity);
        assert!(marker.entity().is_some());

        drop(entity);
        assert!(marker.entity().is_none());
    }
}
