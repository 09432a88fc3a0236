//! Background task that drains the position subscription into the session.
//!
//! One consumer, one event at a time: every sample is ingested under the
//! session lock, so nothing mutates the path concurrently. The loop exits on
//! cancellation, and the controller joins it before completing the transition
//! that requested teardown, so no stale sample is ever processed afterwards.

use std::sync::Arc;

use log::{debug, error, warn};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::{
    archive::RunArchive,
    error::TrackError,
    session::controller::{finalize_and_archive, SessionEvent},
    session::state::SessionCore,
    source::PositionEvent,
};

pub(crate) async fn watch_loop(
    state: Arc<Mutex<SessionCore>>,
    archive: Arc<RunArchive>,
    events: broadcast::Sender<SessionEvent>,
    mut positions: mpsc::Receiver<PositionEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("position watch cancelled");
                break;
            }
            event = positions.recv() => {
                // A closed channel means the source went away without saying
                // why; tracking cannot continue either way.
                let event = event.unwrap_or_else(|| {
                    PositionEvent::Unavailable("position stream ended".into())
                });

                match event {
                    PositionEvent::Sample(sample) => {
                        let accepted = { state.lock().await.ingest(sample) };
                        if accepted {
                            let _ = events.send(SessionEvent::PositionUpdated(sample.point));
                        } else {
                            debug!(
                                "fix rejected (accuracy {:.0} m, t={})",
                                sample.accuracy_m, sample.timestamp_ms
                            );
                        }
                    }
                    PositionEvent::Unavailable(reason) => {
                        let failure = TrackError::PositionUnavailable(reason);
                        warn!("stopping session: {failure}");
                        let _ = events.send(SessionEvent::SourceFailed(failure));
                        if let Err(err) = finalize_and_archive(&state, &archive, &events).await {
                            error!("forced stop after source failure: {err}");
                        }
                        break;
                    }
                }
            }
        }
    }
}
