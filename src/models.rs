//! Persisted record types and their on-disk format.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// A closed polygon of captured ground: first point repeated as the last.
pub type CapturedArea = Vec<GeoPoint>;

/// A finished run, assembled once at session stop and immutable thereafter.
///
/// The serialized field names and the `[lat, lng]` pair encoding of `path`
/// and `capturedAreas` are the on-disk record format already written by
/// earlier builds of the app; both must be preserved exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRun {
    pub id: String,
    pub date_iso: String,
    pub path: Vec<GeoPoint>,
    pub distance_km: f64,
    pub active_duration_seconds: i64,
    pub total_duration_seconds: i64,
    pub pause_count: u32,
    pub pause_duration_seconds: i64,
    pub captured_areas: Vec<CapturedArea>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> SavedRun {
        SavedRun {
            id: "run-1".into(),
            date_iso: "2026-03-01T08:30:00Z".into(),
            path: vec![GeoPoint::new(51.5, -0.12), GeoPoint::new(51.6, -0.13)],
            distance_km: 11.2,
            active_duration_seconds: 3_500,
            total_duration_seconds: 3_600,
            pause_count: 1,
            pause_duration_seconds: 100,
            captured_areas: vec![vec![
                GeoPoint::new(51.5, -0.12),
                GeoPoint::new(51.6, -0.13),
                GeoPoint::new(51.55, -0.14),
                GeoPoint::new(51.5, -0.12),
            ]],
        }
    }

    #[test]
    fn record_format_uses_exact_field_names_and_pair_order() {
        let json = serde_json::to_value(fixture()).unwrap();
        let object = json.as_object().unwrap();
        for field in [
            "id",
            "dateIso",
            "path",
            "distanceKm",
            "activeDurationSeconds",
            "totalDurationSeconds",
            "pauseCount",
            "pauseDurationSeconds",
            "capturedAreas",
        ] {
            assert!(object.contains_key(field), "missing field {field}");
        }

        // Paths persist as [lat, lng] pairs.
        assert_eq!(json["path"][0][0], 51.5);
        assert_eq!(json["path"][0][1], -0.12);
        assert_eq!(json["capturedAreas"][0].as_array().unwrap().len(), 4);
    }

    #[test]
    fn record_round_trips_through_json() {
        let run = fixture();
        let json = serde_json::to_string(&run).unwrap();
        let back: SavedRun = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, run.id);
        assert_eq!(back.path, run.path);
        assert_eq!(back.captured_areas, run.captured_areas);
        assert_eq!(back.pause_count, run.pause_count);
    }
}
