//! Closed-loop detection over a finished path.

use crate::geo::{self, GeoPoint};

/// Maximum start-to-end distance for a path to count as a closed loop.
///
/// Deliberately much wider than the jitter gate: the runner closing a loop
/// arrives with accumulated GPS drift, so a tight threshold would reject real
/// loops. Tuning it is a product decision.
pub const DEFAULT_CLOSURE_THRESHOLD_M: f64 = 50.0;

/// Decide whether `path` closed on itself, and if so return the captured
/// polygon: the path with its first point repeated as the closing point.
///
/// Runs once, on the finished path; closure is never checked incrementally.
///
/// This is a distance-only heuristic. It does not validate non-self-
/// intersection or a minimum enclosed area, so degenerate or self-crossing
/// paths whose endpoints happen to be near each other are accepted. Known
/// limitation, kept until product requirements tighten it.
pub fn detect(path: &[GeoPoint], closure_threshold_m: f64) -> Option<Vec<GeoPoint>> {
    if path.len() <= 2 {
        // Fewer than 3 distinct points cannot bound an area.
        return None;
    }

    let start = path[0];
    let end = path[path.len() - 1];
    if geo::distance_m(start, end) >= closure_threshold_m {
        return None;
    }

    let mut ring = path.to_vec();
    ring.push(start);
    Some(ring)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_point_path_is_never_a_territory() {
        let start = GeoPoint::new(51.5074, -0.1278);
        let path = vec![start, start];
        assert!(detect(&path, DEFAULT_CLOSURE_THRESHOLD_M).is_none());
    }

    #[test]
    fn coincident_endpoints_yield_a_closed_ring() {
        let path = vec![
            GeoPoint::new(51.5074, -0.1278),
            GeoPoint::new(51.5080, -0.1290),
            GeoPoint::new(51.5074, -0.1278),
        ];
        let ring = detect(&path, DEFAULT_CLOSURE_THRESHOLD_M).unwrap();
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn nearby_endpoints_within_threshold_close_the_loop() {
        // End ~20 m north of the start, inside the 50 m default.
        let path = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.001, 0.001),
            GeoPoint::new(0.002, 0.0),
            GeoPoint::new(20.0 / 111_320.0, 0.0),
        ];
        let ring = detect(&path, DEFAULT_CLOSURE_THRESHOLD_M).unwrap();
        assert_eq!(ring.len(), path.len() + 1);
        assert_eq!(*ring.last().unwrap(), path[0]);
    }

    #[test]
    fn open_path_yields_no_territory() {
        let path = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.01, 0.01),
            GeoPoint::new(0.02, 0.02),
        ];
        assert!(detect(&path, DEFAULT_CLOSURE_THRESHOLD_M).is_none());
    }
}
