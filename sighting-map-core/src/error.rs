//! Errors surfaced by the map synchronizer.

use thiserror::Error;

use crate::SurfaceError;

/// Errors returned by
/// [`MapSynchronizer::set_content`](crate::MapSynchronizer::set_content).
///
/// Each variant names the offending position in the assigned sequence. The
/// synchronizer's previous content stays in place when one is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContentError {
    /// An entity has no identity.
    #[error("entity at index {index} has no identity")]
    MissingIdentity {
        /// Position in the assigned content.
        index: usize,
    },
    /// An entity has no coordinates.
    #[error("entity at index {index} has no coordinates")]
    MissingLocation {
        /// Position in the assigned content.
        index: usize,
    },
    /// An entity's latitude is out of range or a coordinate is not finite.
    #[error("entity at index {index} has invalid coordinates ({latitude}, {longitude})")]
    InvalidLocation {
        /// Position in the assigned content.
        index: usize,
        /// Offending latitude.
        latitude: f64,
        /// Offending longitude.
        longitude: f64,
    },
    /// Two entities share an identity.
    #[error("entity at index {index} repeats identity {id}")]
    DuplicateIdentity {
        /// Position of the repeat in the assigned content.
        index: usize,
        /// Debug rendering of the repeated identity.
        id: String,
    },
}

/// Errors returned by [`MapSynchronizer::mount`](crate::MapSynchronizer::mount).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MountError {
    /// The synchronizer already owns a live surface.
    #[error("map is already mounted")]
    AlreadyMounted,
    /// The backend could not provide a working surface. Any partially
    /// created surface has been released.
    #[error("failed to create map surface: {0}")]
    Surface(#[from] SurfaceError),
}
