use serde::{Deserialize, Serialize};

/// Geographic position. Serialized as `[lon, lat]`, the same way map renderers take it.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    /// Longitude in degrees.
    pub lng: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl LngLat {
    /// Creates a new position.
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(value: LngLat) -> Self {
        [value.lng, value.lat]
    }
}

/// Camera of a map.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    /// Center of the map.
    pub center: LngLat,
    /// Zoom level.
    pub zoom: f64,
    /// The map cannot be zoomed in further than this.
    pub max_zoom: f64,
}

impl Default for MapView {
    /// Contiguous United States.
    fn default() -> Self {
        Self {
            center: LngLat::new(-98.5795, 39.8283),
            zoom: 3.5,
            max_zoom: 10.0,
        }
    }
}
