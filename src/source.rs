//! The position-source collaborator: a cancellable stream of fixes.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::sync::mpsc;

use crate::geo::GeoSample;

/// Options passed through to the underlying positioning hardware/API.
#[derive(Debug, Clone, Copy)]
pub struct SourceConfig {
    pub high_accuracy: bool,
    /// How long the source may take to produce a single fix.
    pub timeout_ms: u64,
    /// Maximum age of a cached fix the source may replay; 0 = always fresh.
    pub max_sample_age_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 10_000,
            max_sample_age_ms: 0,
        }
    }
}

/// What a subscription delivers: fixes, or the reason there will be no more.
#[derive(Debug, Clone)]
pub enum PositionEvent {
    Sample(GeoSample),
    /// The source cannot produce fixes (permission denied, hardware failure).
    Unavailable(String),
}

/// A subscribable stream of position events.
///
/// Subscribing hands back the receiving end of a channel; unsubscribing is
/// dropping that receiver. Implementations must stop producing once the
/// receiver is gone.
pub trait PositionSource: Send + Sync {
    fn subscribe(&self, config: SourceConfig) -> mpsc::Receiver<PositionEvent>;
}

/// Replays a fixed sample script on a cadence.
///
/// The demo binary and the tests drive the live pipeline with this instead of
/// real positioning hardware. After the script runs out the channel is held
/// open (a quiet receiver, like a runner standing still) unless a terminal
/// `Unavailable` event was configured.
pub struct ScriptedSource {
    samples: Arc<Vec<GeoSample>>,
    step: Duration,
    fail_after: Option<String>,
}

impl ScriptedSource {
    pub fn new(samples: Vec<GeoSample>, step: Duration) -> Self {
        Self {
            samples: Arc::new(samples),
            step,
            fail_after: None,
        }
    }

    /// End the script with an `Unavailable` event carrying `reason`.
    pub fn failing_after_script(mut self, reason: impl Into<String>) -> Self {
        self.fail_after = Some(reason.into());
        self
    }
}

impl PositionSource for ScriptedSource {
    fn subscribe(&self, _config: SourceConfig) -> mpsc::Receiver<PositionEvent> {
        let (tx, rx) = mpsc::channel(16);
        let samples = Arc::clone(&self.samples);
        let step = self.step;
        let fail_after = self.fail_after.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(step);
            for sample in samples.iter() {
                ticker.tick().await;
                if tx.send(PositionEvent::Sample(*sample)).await.is_err() {
                    debug!("scripted source: subscriber went away mid-script");
                    return;
                }
            }

            if let Some(reason) = fail_after {
                let _ = tx.send(PositionEvent::Unavailable(reason)).await;
                return;
            }

            // Script exhausted: stay subscribed but silent until unsubscribed.
            tx.closed().await;
        });

        rx
    }
}
