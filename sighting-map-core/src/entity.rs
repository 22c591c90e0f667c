//! The contract between domain records and the map synchronizer.
//!
//! The synchronizer only ever reads two things from a record: an identity used
//! to key rendered markers, and a position used to place them. Both accessors
//! return `Option` because records arriving from the backend may be
//! incomplete; such records are rejected when content is assigned rather than
//! silently dropped.

use std::fmt::Debug;
use std::hash::Hash;

use geo::Coord;

/// A record that can be placed on the map.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use sighting_map_core::{Entity, lat_lng};
///
/// struct Nest {
///     ring: u32,
///     at: Coord<f64>,
/// }
///
/// impl Entity for Nest {
///     type Id = u32;
///
///     fn id(&self) -> Option<u32> {
///         Some(self.ring)
///     }
///
///     fn location(&self) -> Option<Coord<f64>> {
///         Some(self.at)
///     }
/// }
///
/// let nest = Nest { ring: 7, at: lat_lng(51.5, -0.1) };
/// assert_eq!(nest.location().map(|c| c.y), Some(51.5));
/// ```
pub trait Entity {
    /// Identity key. Must be unique within one content assignment.
    type Id: Clone + Eq + Hash + Debug;

    /// Stable identity, or `None` when the record has not been assigned one.
    fn id(&self) -> Option<Self::Id>;

    /// Position of the record, or `None` when it has no coordinates.
    fn location(&self) -> Option<Coord<f64>>;
}

/// Build a coordinate from the latitude-first order mapping libraries use.
///
/// # Examples
/// ```
/// use sighting_map_core::lat_lng;
///
/// let c = lat_lng(10.0, 20.0);
/// assert_eq!((c.x, c.y), (20.0, 10.0));
/// ```
#[must_use]
pub const fn lat_lng(latitude: f64, longitude: f64) -> Coord<f64> {
    Coord {
        x: longitude,
        y: latitude,
    }
}

/// Whether `location` can be placed on the map.
///
/// Latitude must lie within `-90..=90`. Longitude may be any finite value;
/// readings east of the antimeridian are often recorded past `180` and the
/// map wraps them. Non-finite components are rejected.
#[must_use]
pub fn is_valid_location(location: Coord<f64>) -> bool {
    (-90.0..=90.0).contains(&location.y) && location.x.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(lat_lng(0.0, 0.0), true)]
    #[case(lat_lng(90.0, 180.0), true)]
    #[case(lat_lng(-90.0, -180.0), true)]
    #[case(lat_lng(90.5, 0.0), false)]
    #[case(lat_lng(51.0, -190.0), true)]
    #[case(lat_lng(-12.0, 200.0), true)]
    #[case(lat_lng(-90.1, 0.0), false)]
    #[case(lat_lng(f64::NAN, 0.0), false)]
    #[case(lat_lng(0.0, f64::INFINITY), false)]
    #[case(lat_lng(0.0, f64::NAN), false)]
    fn accepts_wrapped_longitudes_but_not_polar_overflow(
        #[case] location: Coord<f64>,
        #[case] expected: bool,
    ) {
        assert_eq!(is_valid_location(location), expected);
    }
}
