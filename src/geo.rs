//! Geographic value types and great-circle helpers.
//!
//! Distance and bearing come from the `geo` crate's haversine implementation,
//! which assumes a spherical Earth (WGS84 coordinates in degrees, the frame
//! GPS receivers report in). Accurate to well under 1% for run-length tracks.

use geo::{Bearing, Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

/// A position on the Earth's surface, latitude/longitude in degrees.
///
/// Serializes as a two-element `[lat, lng]` array. That ordering is part of
/// the persisted record format and must not change; note it is the reverse of
/// the `(x, y)` = `(lng, lat)` order the `geo` crate uses internally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Convert to a `geo` point. `geo` expects `(x, y)` = `(lng, lat)`.
    fn to_geo(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(point: GeoPoint) -> Self {
        [point.latitude, point.longitude]
    }
}

/// A single fix reported by the position source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoSample {
    pub point: GeoPoint,
    /// Reported horizontal accuracy radius, meters.
    pub accuracy_m: f64,
    /// Epoch milliseconds at which the fix was taken.
    pub timestamp_ms: i64,
}

impl GeoSample {
    pub fn new(point: GeoPoint, accuracy_m: f64, timestamp_ms: i64) -> Self {
        Self {
            point,
            accuracy_m,
            timestamp_ms,
        }
    }
}

/// Great-circle distance between two points, in meters.
#[inline]
pub fn distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    Haversine::distance(a.to_geo(), b.to_geo())
}

/// Total great-circle length of a polyline, in meters.
///
/// Paths with fewer than two points have zero length.
pub fn path_length_m(points: &[GeoPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|pair| distance_m(pair[0], pair[1]))
        .sum()
}

/// Initial bearing from `a` to `b`, degrees clockwise from north in `[0, 360)`.
#[inline]
pub fn bearing_deg(a: GeoPoint, b: GeoPoint) -> f64 {
    Haversine::bearing(a.to_geo(), b.to_geo()).rem_euclid(360.0)
}
