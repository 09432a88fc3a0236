//! Raw fix gating: accuracy, displacement and implied-speed checks.

use crate::geo::{self, GeoSample};

/// Tunable gating thresholds.
///
/// The defaults are starting points, not physical truths; what counts as an
/// acceptable fix is a product decision, so every threshold is injectable.
#[derive(Debug, Clone, Copy)]
pub struct FilterConfig {
    /// Fixes with a reported accuracy radius larger than this are dropped.
    pub max_accuracy_m: f64,

    /// Movement below this distance from the last accepted fix is treated as
    /// receiver jitter while stationary and dropped.
    pub min_displacement_m: f64,

    /// Fixes implying a speed above this are multipath/teleport spikes.
    pub max_speed_mps: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_accuracy_m: 50.0,
            min_displacement_m: 2.0,
            max_speed_mps: 25.0,
        }
    }
}

/// Pure accept/reject decision over a candidate fix and the last accepted one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleFilter {
    config: FilterConfig,
}

impl SampleFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Apply the gates in order, short-circuiting on the first failure.
    ///
    /// No side effects: rejection leaves the caller's baseline untouched, so
    /// the next candidate is still compared against the same accepted fix.
    pub fn accept(&self, sample: &GeoSample, last_accepted: Option<&GeoSample>) -> bool {
        if sample.accuracy_m > self.config.max_accuracy_m {
            return false;
        }

        let Some(last) = last_accepted else {
            // First fix of the session only has to pass the accuracy gate.
            return true;
        };

        let displacement_m = geo::distance_m(last.point, sample.point);
        if displacement_m < self.config.min_displacement_m {
            return false;
        }

        let dt_s = (sample.timestamp_ms - last.timestamp_ms) as f64 / 1000.0;
        if dt_s > 0.0 {
            let speed_mps = displacement_m / dt_s;
            if speed_mps > self.config.max_speed_mps {
                return false;
            }
        }
        // dt <= 0 (clock skew, out-of-order delivery): the speed gate cannot
        // be evaluated meaningfully, so the sample passes this check only.

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;

    fn sample(lat: f64, lng: f64, accuracy_m: f64, timestamp_ms: i64) -> GeoSample {
        GeoSample::new(GeoPoint::new(lat, lng), accuracy_m, timestamp_ms)
    }

    /// A point roughly `meters` north of (0, 0). 1 degree latitude ~= 111.32 km.
    fn meters_north(meters: f64) -> f64 {
        meters / 111_320.0
    }

    #[test]
    fn inaccurate_fix_is_rejected_regardless_of_other_fields() {
        let filter = SampleFilter::default();
        let candidate = sample(0.0, 0.0, 51.0, 1_000);
        assert!(!filter.accept(&candidate, None));
        assert!(!filter.accept(&candidate, Some(&sample(1.0, 1.0, 5.0, 0))));
    }

    #[test]
    fn first_fix_needs_only_the_accuracy_gate() {
        let filter = SampleFilter::default();
        assert!(filter.accept(&sample(0.0, 0.0, 10.0, 0), None));
    }

    #[test]
    fn stationary_jitter_is_rejected() {
        let filter = SampleFilter::default();
        let last = sample(0.0, 0.0, 5.0, 0);
        let one_meter_away = sample(meters_north(1.0), 0.0, 5.0, 1_000);
        assert!(!filter.accept(&one_meter_away, Some(&last)));
    }

    #[test]
    fn teleport_spike_is_rejected() {
        let filter = SampleFilter::default();
        let last = sample(0.0, 0.0, 5.0, 0);
        // 100 m in 1 s implies 100 m/s, far beyond the 25 m/s cap.
        let spike = sample(meters_north(100.0), 0.0, 5.0, 1_000);
        assert!(!filter.accept(&spike, Some(&last)));
    }

    #[test]
    fn plausible_movement_is_accepted() {
        let filter = SampleFilter::default();
        let last = sample(0.0, 0.0, 5.0, 0);
        // 10 m in 2 s = 5 m/s, a brisk run.
        let next = sample(meters_north(10.0), 0.0, 5.0, 2_000);
        assert!(filter.accept(&next, Some(&last)));
    }

    #[test]
    fn non_positive_dt_skips_the_speed_gate() {
        let filter = SampleFilter::default();
        let last = sample(0.0, 0.0, 5.0, 5_000);
        // Out-of-order timestamp: the jump would imply infinite speed, but the
        // speed gate is undefined for dt <= 0, so only the other gates apply.
        let out_of_order = sample(meters_north(100.0), 0.0, 5.0, 5_000);
        assert!(filter.accept(&out_of_order, Some(&last)));
    }
}
