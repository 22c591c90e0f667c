//! Basemap presets for the sighting map.
//!
//! The tracker renders the same markers over two different basemaps: a
//! standard OpenStreetMap raster layer and an Arctic polar projection whose
//! library supplies its own tiles. Everything that differs between them lives
//! here so a single synchronizer serves both.
//!
//! # Examples
//! ```
//! use sighting_map_core::{Basemap, BasemapKind};
//!
//! let kind: BasemapKind = "polar".parse().expect("known basemap");
//! let basemap = Basemap::from(kind);
//! assert_eq!(basemap.zoom, 5);
//! assert!(basemap.tiles.is_none());
//! ```

use std::str::FromStr;

use geo::Coord;
use thiserror::Error;

use crate::{MarkerIcon, lat_lng};

const OSM_TILE_URL: &str = "http://{s}.tile.osm.org/{z}/{x}/{y}.png";
const OSM_ATTRIBUTION: &str =
    "&copy; <a href=\"http://osm.org/copyright\">OpenStreetMap</a> contributors";

/// Named basemap presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum BasemapKind {
    /// OpenStreetMap raster tiles in Web Mercator.
    #[default]
    OpenStreetMap,
    /// Arctic polar projection with library-provided tiles.
    Polar,
}

impl BasemapKind {
    /// Return the preset name as a lowercase `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenStreetMap => "openstreetmap",
            Self::Polar => "polar",
        }
    }
}

impl std::fmt::Display for BasemapKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`BasemapKind`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown basemap: {0}")]
pub struct ParseBasemapError(pub String);

impl FromStr for BasemapKind {
    type Err = ParseBasemapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openstreetmap" | "osm" => Ok(Self::OpenStreetMap),
            "polar" => Ok(Self::Polar),
            _ => Err(ParseBasemapError(s.to_owned())),
        }
    }
}

/// Raster tile layer attached when the map is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayer {
    /// URL template with `{s}`, `{z}`, `{x}` and `{y}` placeholders.
    pub url_template: String,
    /// Attribution HTML shown in the map corner.
    pub attribution: String,
}

/// Image assets for one marker appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconSpec {
    /// Standard resolution image.
    pub icon_url: String,
    /// High-density image.
    pub icon_retina_url: String,
    /// Drop shadow image.
    pub shadow_url: String,
    /// High-density drop shadow image.
    pub shadow_retina_url: String,
}

impl IconSpec {
    fn under(base: &str, icon: &str, retina: &str) -> Self {
        Self {
            icon_url: format!("{base}/{icon}"),
            icon_retina_url: format!("{base}/{retina}"),
            // The shadow ships without a high-density variant.
            shadow_url: format!("{base}/marker-shadow.png"),
            shadow_retina_url: format!("{base}/marker-shadow.png"),
        }
    }
}

/// Everything a backend needs to create the map surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Basemap {
    /// Preset this configuration was built from.
    pub kind: BasemapKind,
    /// Initial map centre.
    pub center: Coord<f64>,
    /// Initial zoom level.
    pub zoom: u8,
    /// Deepest zoom a viewport fit may reach.
    pub max_zoom: u8,
    /// Tile layer to attach, or `None` when the basemap brings its own.
    pub tiles: Option<TileLayer>,
    /// Appearance of unselected markers.
    pub default_icon: IconSpec,
    /// Appearance of the selected marker.
    pub highlighted_icon: IconSpec,
}

impl Basemap {
    /// World view over OpenStreetMap tiles.
    #[must_use]
    pub fn openstreetmap() -> Self {
        Self {
            kind: BasemapKind::OpenStreetMap,
            center: lat_lng(0.0, 0.0),
            zoom: 0,
            max_zoom: 18,
            tiles: Some(TileLayer {
                url_template: OSM_TILE_URL.to_owned(),
                attribution: OSM_ATTRIBUTION.to_owned(),
            }),
            default_icon: IconSpec::under("/images", "marker-icon.png", "marker-icon-2x.png"),
            highlighted_icon: IconSpec::under(
                "/images",
                "marker-yellow.png",
                "marker-yellow-2x.png",
            ),
        }
    }

    /// Arctic view over the polar projection basemap.
    #[must_use]
    pub fn polar() -> Self {
        Self {
            kind: BasemapKind::Polar,
            center: lat_lng(65.0, -100.0),
            zoom: 5,
            max_zoom: 18,
            tiles: None,
            default_icon: IconSpec::under("/assets", "marker-icon.png", "marker-icon-2x.png"),
            highlighted_icon: IconSpec::under(
                "/assets",
                "marker-yellow.png",
                "marker-yellow-2x.png",
            ),
        }
    }

    /// Assets for `icon` under this basemap.
    #[must_use]
    pub const fn icon(&self, icon: MarkerIcon) -> &IconSpec {
        match icon {
            MarkerIcon::Default => &self.default_icon,
            MarkerIcon::Highlighted => &self.highlighted_icon,
        }
    }
}

impl Default for Basemap {
    fn default() -> Self {
        Self::openstreetmap()
    }
}

impl From<BasemapKind> for Basemap {
    fn from(kind: BasemapKind) -> Self {
        match kind {
            BasemapKind::OpenStreetMap => Self::openstreetmap(),
            BasemapKind::Polar => Self::polar(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("openstreetmap", BasemapKind::OpenStreetMap)]
    #[case("OSM", BasemapKind::OpenStreetMap)]
    #[case("Polar", BasemapKind::Polar)]
    fn parses_known_kinds(#[case] input: &str, #[case] expected: BasemapKind) {
        assert_eq!(input.parse::<BasemapKind>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_kind() {
        let err = "mercator".parse::<BasemapKind>().expect_err("unknown kind");
        assert_eq!(err.to_string(), "unknown basemap: mercator");
    }

    #[rstest]
    #[case(BasemapKind::OpenStreetMap)]
    #[case(BasemapKind::Polar)]
    fn display_round_trips_through_parse(#[case] kind: BasemapKind) {
        assert_eq!(kind.to_string().parse::<BasemapKind>(), Ok(kind));
    }

    #[rstest]
    fn presets_differ_in_view_tiles_and_assets() {
        let osm = Basemap::openstreetmap();
        let polar = Basemap::polar();

        assert_eq!((osm.center, osm.zoom), (lat_lng(0.0, 0.0), 0));
        assert_eq!((polar.center, polar.zoom), (lat_lng(65.0, -100.0), 5));
        assert!(osm.tiles.is_some());
        assert!(polar.tiles.is_none());
        assert_eq!(
            osm.icon(MarkerIcon::Highlighted).icon_url,
            "/images/marker-yellow.png"
        );
        assert_eq!(
            polar.icon(MarkerIcon::Highlighted).icon_retina_url,
            "/assets/marker-yellow-2x.png"
        );
        assert_eq!(
            polar.icon(MarkerIcon::Default).shadow_url,
            "/assets/marker-shadow.png"
        );
    }
}
