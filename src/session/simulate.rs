//! Simulation feed: replays a fixed, pre-validated path through the session
//! pipeline on a cadence, without the position source or the filter.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use tokio::sync::{broadcast, Mutex};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::{
    archive::RunArchive,
    geo::GeoPoint,
    session::controller::{finalize_and_archive, SessionEvent},
    session::state::SessionCore,
};

pub(crate) async fn simulation_loop(
    state: Arc<Mutex<SessionCore>>,
    archive: Arc<RunArchive>,
    events: broadcast::Sender<SessionEvent>,
    path: Vec<GeoPoint>,
    step: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(step);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for point in path {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("simulation cancelled");
                return;
            }
            _ = ticker.tick() => {
                let appended = { state.lock().await.ingest_trusted(point) };
                if !appended {
                    // Session left Running underneath us; the transition that
                    // did so owns the finalize.
                    info!("simulation feed ended: session no longer running");
                    return;
                }
                let _ = events.send(SessionEvent::PositionUpdated(point));
            }
        }
    }

    // Same close-out as a live stop: finalize, detect territory, archive.
    match finalize_and_archive(&state, &archive, &events).await {
        Ok(Some(run)) => info!(
            "simulation complete: {:.2} km, {} territories",
            run.distance_km,
            run.captured_areas.len()
        ),
        Ok(None) => info!("simulation complete: nothing tracked"),
        Err(err) => error!("simulation finalize failed: {err}"),
    }
}
