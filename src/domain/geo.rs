use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A WGS84 coordinate in decimal degrees, shaped like a map widget corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Rectangular region in decimal degrees.
///
/// Renders as `south,west,north,east`, the order Overpass QL expects inside
/// a `(...)` bbox filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Build a bbox from the north-east and south-west corners of a map view
    pub fn from_corners(north_east: LatLng, south_west: LatLng) -> Self {
        Self::new(south_west.lat, south_west.lng, north_east.lat, north_east.lng)
    }

    /// Approximate bbox of `radius_m` meters around `center`
    pub fn around(center: LatLng, radius_m: u32) -> Self {
        let radius_km = radius_m as f64 / 1000.0;

        // 1 degree latitude ≈ 111 km
        // 1 degree longitude ≈ 111 km * cos(lat)
        let lat_delta = radius_km / 111.0;
        let lon_delta = radius_km / (111.0 * center.lat.to_radians().cos());

        Self::new(
            center.lat - lat_delta,
            center.lng - lon_delta,
            center.lat + lat_delta,
            center.lng + lon_delta,
        )
    }

    pub fn north_east(&self) -> LatLng {
        LatLng::new(self.north, self.east)
    }

    pub fn south_west(&self) -> LatLng {
        LatLng::new(self.south, self.west)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.south, self.west, self.north, self.east)
    }
}

impl FromStr for BoundingBox {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| Error::InvalidInput(format!("bbox {s:?}: {e}")))?;

        match parts.as_slice() {
            &[south, west, north, east] => Ok(Self::new(south, west, north, east)),
            _ => Err(Error::InvalidInput(format!(
                "bbox {s:?}: expected south,west,north,east"
            ))),
        }
    }
}
