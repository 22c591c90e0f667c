//! Wildlife sightings as rendered by the tracker's map pane.

use geo::Coord;

use crate::{Entity, lat_lng};

/// A reported wildlife sighting.
///
/// Records come from the tracker backend, where the identity is assigned on
/// save and coordinates are optional until the observer pins the location.
/// Both gaps are legal here and are reported by the synchronizer when the
/// record is handed to the map.
///
/// # Examples
/// ```
/// use sighting_map_core::{Entity, Sighting, lat_lng};
///
/// let sighting = Sighting::new(4, lat_lng(64.8, -147.7), "Moose")
///     .with_notes("cow with calf")
///     .with_status(2);
/// assert_eq!(sighting.id(), Some(4));
/// assert_eq!(sighting.location(), Some(lat_lng(64.8, -147.7)));
/// assert_eq!(sighting.notes.as_deref(), Some("cow with calf"));
/// assert_eq!(sighting.status_id, Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Sighting {
    /// Backend identifier, absent for unsaved sightings.
    pub id: Option<u64>,
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
    /// Common name of the observed species.
    pub species: String,
    /// Free-form observer notes.
    pub notes: Option<String>,
    /// Reference to the sighting's review status.
    pub status_id: Option<u64>,
}

impl Sighting {
    /// Construct a saved sighting at `location`.
    #[must_use]
    pub fn new(id: u64, location: Coord<f64>, species: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            latitude: Some(location.y),
            longitude: Some(location.x),
            species: species.into(),
            notes: None,
            status_id: None,
        }
    }

    /// Attach observer notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Attach a review status reference.
    #[must_use]
    pub const fn with_status(mut self, status_id: u64) -> Self {
        self.status_id = Some(status_id);
        self
    }
}

impl Entity for Sighting {
    type Id = u64;

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn location(&self) -> Option<Coord<f64>> {
        Some(lat_lng(self.latitude?, self.longitude?))
    }
}
