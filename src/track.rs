//! The accumulated path of one tracking session.

use crate::geo::{self, GeoPoint};

/// Ordered sequence of accepted positions, insertion order = acceptance order.
///
/// Distance is never cached: it is recomputed from the points on every query,
/// so it can never drift from the path it is derived from. O(n) per query is
/// fine at run scale (thousands of points, not millions).
#[derive(Debug, Clone, Default)]
pub struct TrackPath {
    points: Vec<GeoPoint>,
}

impl TrackPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, point: GeoPoint) {
        self.points.push(point);
    }

    pub fn reset(&mut self) {
        self.points.clear();
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total great-circle length of the path, kilometers.
    pub fn distance_km(&self) -> f64 {
        geo::path_length_m(&self.points) / 1000.0
    }

    /// Most recently accepted position, if any.
    pub fn current_position(&self) -> Option<GeoPoint> {
        self.points.last().copied()
    }

    /// Bearing of the last segment, degrees clockwise from north in `[0, 360)`.
    ///
    /// 0.0 until two points exist; the map surface treats that as "north up".
    pub fn heading_deg(&self) -> f64 {
        match self.points.as_slice() {
            [.., prev, last] => geo::bearing_deg(*prev, *last),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_and_single_point_paths_have_zero_distance() {
        let mut path = TrackPath::new();
        assert_eq!(path.distance_km(), 0.0);
        path.append(GeoPoint::new(51.5074, -0.1278));
        assert_eq!(path.distance_km(), 0.0);
    }

    #[test]
    fn distance_matches_recomputation_from_the_points() {
        let mut path = TrackPath::new();
        for point in [
            GeoPoint::new(51.5074, -0.1278),
            GeoPoint::new(51.5080, -0.1290),
            GeoPoint::new(51.5090, -0.1300),
            GeoPoint::new(51.5095, -0.1310),
        ] {
            path.append(point);
        }

        let expected_m = geo::path_length_m(path.points());
        assert_relative_eq!(path.distance_km(), expected_m / 1000.0, epsilon = 1e-12);
        // Querying twice from the same path yields the same value.
        assert_eq!(path.distance_km(), path.distance_km());
    }

    #[test]
    fn heading_tracks_the_last_segment() {
        let mut path = TrackPath::new();
        assert_eq!(path.heading_deg(), 0.0);
        path.append(GeoPoint::new(0.0, 0.0));
        assert_eq!(path.heading_deg(), 0.0);
        path.append(GeoPoint::new(0.0, 0.5));
        assert_relative_eq!(path.heading_deg(), 90.0, epsilon = 1e-6);
        path.append(GeoPoint::new(0.5, 0.5));
        assert_relative_eq!(path.heading_deg(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn reset_clears_points_and_distance() {
        let mut path = TrackPath::new();
        path.append(GeoPoint::new(51.5, -0.12));
        path.append(GeoPoint::new(51.6, -0.13));
        path.reset();
        assert!(path.is_empty());
        assert_eq!(path.distance_km(), 0.0);
        assert_eq!(path.current_position(), None);
    }
}
