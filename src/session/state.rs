//! Synchronous session state: everything the async controller mutates under
//! its lock lives here, so the whole state machine is testable without a
//! runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TrackError},
    filter::SampleFilter,
    geo::{GeoPoint, GeoSample},
    models::{CapturedArea, SavedRun},
    session::clock::SessionClock,
    territory,
    track::TrackPath,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TrackingStatus {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// Read model for the map surface and any other display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSnapshot {
    pub status: TrackingStatus,
    pub session_id: Option<String>,
    pub path: Vec<GeoPoint>,
    pub captured_areas: Vec<CapturedArea>,
    pub current_position: Option<GeoPoint>,
    /// Bearing from the last two accepted fixes, degrees, 0 = north.
    pub heading_deg: f64,
    pub distance_km: f64,
    pub elapsed_active_ms: i64,
    pub pause_count: u32,
}

/// All state owned by the one active session.
///
/// Exactly one of these exists per controller; a new session reuses it by
/// resetting rather than reallocating, so nothing session-scoped can leak
/// across runs.
#[derive(Debug)]
pub struct SessionCore {
    status: TrackingStatus,
    session_id: Option<String>,
    started_at: Option<DateTime<Utc>>,
    clock: SessionClock,
    path: TrackPath,
    filter: SampleFilter,
    last_accepted: Option<GeoSample>,
    captured_areas: Vec<CapturedArea>,
    closure_threshold_m: f64,
}

impl SessionCore {
    pub fn new(filter: SampleFilter, closure_threshold_m: f64) -> Self {
        Self {
            status: TrackingStatus::Stopped,
            session_id: None,
            started_at: None,
            clock: SessionClock::new(),
            path: TrackPath::new(),
            filter,
            last_accepted: None,
            captured_areas: Vec::new(),
            closure_threshold_m,
        }
    }

    pub fn status(&self) -> TrackingStatus {
        self.status
    }

    /// Stopped -> Running: clear all session-scoped state and start the clock.
    pub fn begin(&mut self, session_id: String, started_at: DateTime<Utc>) -> Result<()> {
        if self.status != TrackingStatus::Stopped {
            return Err(TrackError::InvalidTransition("start while session active"));
        }

        self.path.reset();
        self.captured_areas.clear();
        self.last_accepted = None;
        self.clock.start(started_at.timestamp_millis());
        self.session_id = Some(session_id);
        self.started_at = Some(started_at);
        self.status = TrackingStatus::Running;
        Ok(())
    }

    pub fn pause(&mut self, now_ms: i64) -> Result<()> {
        if self.status != TrackingStatus::Running {
            return Err(TrackError::InvalidTransition("pause while not running"));
        }
        self.clock.pause(now_ms)?;
        self.status = TrackingStatus::Paused;
        Ok(())
    }

    /// Paused -> Running. Path, distance and the filtering baseline survive:
    /// the first fix after a resume is gated against the last fix accepted
    /// before the pause, with no special relaxation.
    pub fn resume(&mut self, now_ms: i64) -> Result<()> {
        if self.status != TrackingStatus::Paused {
            return Err(TrackError::InvalidTransition("resume while not paused"));
        }
        self.clock.resume(now_ms)?;
        self.status = TrackingStatus::Running;
        Ok(())
    }

    /// Run one raw fix through the filter; true means it joined the path.
    ///
    /// Fixes arriving in any state but Running are discarded outright.
    pub fn ingest(&mut self, sample: GeoSample) -> bool {
        if self.status != TrackingStatus::Running {
            return false;
        }
        if !self.filter.accept(&sample, self.last_accepted.as_ref()) {
            return false;
        }
        self.path.append(sample.point);
        self.last_accepted = Some(sample);
        true
    }

    /// Append a pre-validated point, bypassing the filter (simulation feed).
    pub fn ingest_trusted(&mut self, point: GeoPoint) -> bool {
        if self.status != TrackingStatus::Running {
            return false;
        }
        self.path.append(point);
        true
    }

    /// Close out the session: fold the clock, run territory detection, and
    /// assemble the persisted record if anything was actually tracked. Resets
    /// every piece of session state ready for the next `begin`.
    pub fn finalize(&mut self, now: DateTime<Utc>) -> Result<Option<SavedRun>> {
        if self.status == TrackingStatus::Stopped {
            return Err(TrackError::InvalidTransition("stop while already stopped"));
        }

        let summary = self.clock.finalize(now.timestamp_millis());
        if let Some(area) = territory::detect(self.path.points(), self.closure_threshold_m) {
            self.captured_areas.push(area);
        }

        let run = match (&self.session_id, &self.started_at) {
            (Some(id), Some(started_at)) if !self.path.is_empty() => Some(SavedRun {
                id: id.clone(),
                date_iso: started_at.to_rfc3339(),
                path: self.path.points().to_vec(),
                distance_km: self.path.distance_km(),
                active_duration_seconds: summary.active_seconds,
                total_duration_seconds: summary.total_elapsed_seconds,
                pause_count: summary.pause_count,
                pause_duration_seconds: summary.pause_duration_seconds,
                captured_areas: self.captured_areas.clone(),
            }),
            _ => None,
        };

        self.status = TrackingStatus::Stopped;
        self.session_id = None;
        self.started_at = None;
        self.clock = SessionClock::new();
        self.path.reset();
        self.last_accepted = None;
        self.captured_areas.clear();

        Ok(run)
    }

    pub fn snapshot(&self, now_ms: i64) -> TrackSnapshot {
        TrackSnapshot {
            status: self.status,
            session_id: self.session_id.clone(),
            path: self.path.points().to_vec(),
            captured_areas: self.captured_areas.clone(),
            current_position: self.path.current_position(),
            heading_deg: self.path.heading_deg(),
            distance_km: self.path.distance_km(),
            elapsed_active_ms: self.clock.elapsed_active_ms(now_ms),
            pause_count: self.clock.pause_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn core() -> SessionCore {
        SessionCore::new(SampleFilter::default(), 50.0)
    }

    fn started(core: &mut SessionCore) -> DateTime<Utc> {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        core.begin("run-1".into(), t0).unwrap();
        t0
    }

    fn sample(lat: f64, lng: f64, timestamp_ms: i64) -> GeoSample {
        GeoSample::new(GeoPoint::new(lat, lng), 5.0, timestamp_ms)
    }

    #[test]
    fn fixes_outside_a_running_session_are_discarded() {
        let mut core = core();
        assert!(!core.ingest(sample(51.5, -0.12, 0)));

        let t0 = started(&mut core);
        core.pause(t0.timestamp_millis() + 1_000).unwrap();
        assert!(!core.ingest(sample(51.5, -0.12, 0)));
    }

    #[test]
    fn accepted_fix_becomes_the_gating_baseline() {
        let mut core = core();
        started(&mut core);
        assert!(core.ingest(sample(0.0, 0.0, 0)));
        // 1 m of jitter against the accepted baseline: rejected.
        assert!(!core.ingest(sample(1.0 / 111_320.0, 0.0, 1_000)));
        // The baseline did not move, so 10 m from the first fix passes.
        assert!(core.ingest(sample(10.0 / 111_320.0, 0.0, 2_000)));
    }

    #[test]
    fn baseline_survives_pause_and_resume() {
        let mut core = core();
        let t0 = started(&mut core);
        assert!(core.ingest(sample(0.0, 0.0, 0)));

        let t_ms = t0.timestamp_millis();
        core.pause(t_ms + 5_000).unwrap();
        core.resume(t_ms + 10_000).unwrap();

        // First fix after resume is gated against the pre-pause baseline.
        assert!(!core.ingest(sample(1.0 / 111_320.0, 0.0, 11_000)));
        assert_eq!(core.snapshot(t_ms + 11_000).path.len(), 1);
    }

    #[test]
    fn finalize_with_no_accepted_fixes_produces_no_run() {
        let mut core = core();
        let t0 = started(&mut core);
        let run = core.finalize(t0 + chrono::Duration::seconds(30)).unwrap();
        assert!(run.is_none());
        assert_eq!(core.status(), TrackingStatus::Stopped);
    }

    #[test]
    fn finalize_assembles_the_record_and_resets() {
        let mut core = core();
        let t0 = started(&mut core);
        let t_ms = t0.timestamp_millis();

        assert!(core.ingest(sample(0.0, 0.0, t_ms)));
        assert!(core.ingest(sample(0.001, 0.0, t_ms + 10_000)));
        assert!(core.ingest(sample(0.001, 0.001, t_ms + 20_000)));

        core.pause(t_ms + 25_000).unwrap();
        core.resume(t_ms + 30_000).unwrap();

        let run = core
            .finalize(t0 + chrono::Duration::seconds(40))
            .unwrap()
            .expect("a tracked session produces a run");
        assert_eq!(run.id, "run-1");
        assert_eq!(run.date_iso, t0.to_rfc3339());
        assert_eq!(run.path.len(), 3);
        assert!(run.distance_km > 0.0);
        assert_eq!(run.total_duration_seconds, 40);
        assert_eq!(run.pause_duration_seconds, 5);
        assert_eq!(run.active_duration_seconds, 35);
        assert_eq!(run.pause_count, 1);
        // Endpoints ~150 m apart: no territory.
        assert!(run.captured_areas.is_empty());

        let snapshot = core.snapshot(t_ms + 50_000);
        assert_eq!(snapshot.status, TrackingStatus::Stopped);
        assert!(snapshot.path.is_empty());
        assert_eq!(snapshot.distance_km, 0.0);
        assert_eq!(snapshot.pause_count, 0);
    }

    #[test]
    fn closed_loop_session_captures_territory() {
        let mut core = core();
        let t0 = started(&mut core);
        let t_ms = t0.timestamp_millis();

        // A small square, ending back at the start.
        let loop_points = [
            (0.0, 0.0),
            (0.001, 0.0),
            (0.001, 0.001),
            (0.0, 0.001),
            (0.0, 0.0),
        ];
        for (i, (lat, lng)) in loop_points.iter().enumerate() {
            assert!(core.ingest(sample(*lat, *lng, t_ms + i as i64 * 30_000)));
        }

        let run = core
            .finalize(t0 + chrono::Duration::seconds(180))
            .unwrap()
            .unwrap();
        assert_eq!(run.captured_areas.len(), 1);
        let ring = &run.captured_areas[0];
        assert_eq!(ring.len(), loop_points.len() + 1);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn transitions_are_guarded() {
        let mut core = core();
        assert!(core.pause(0).is_err());
        assert!(core.resume(0).is_err());
        assert!(core.finalize(Utc::now()).is_err());

        started(&mut core);
        assert!(core.resume(0).is_err());
        assert!(core
            .begin("run-2".into(), Utc::now())
            .is_err());
    }
}
