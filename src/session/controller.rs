use std::{sync::Arc, time::Duration};

use chrono::Utc;
use log::{error, info};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    archive::RunArchive,
    error::{Result, TrackError},
    filter::{FilterConfig, SampleFilter},
    geo::GeoPoint,
    models::SavedRun,
    session::{
        simulate::simulation_loop,
        state::{SessionCore, TrackSnapshot, TrackingStatus},
        watcher::watch_loop,
    },
    source::{PositionSource, SourceConfig},
    territory,
};

/// Everything tunable about a session, injected once at construction.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub filter: FilterConfig,
    pub closure_threshold_m: f64,
    pub source: SourceConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            closure_threshold_m: territory::DEFAULT_CLOSURE_THRESHOLD_M,
            source: SourceConfig::default(),
        }
    }
}

/// Notifications for whatever front end is listening (map surface, history
/// view). Best-effort broadcast: a slow or absent listener never blocks the
/// engine.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged(TrackSnapshot),
    /// A new accepted fix; the map centers on it.
    PositionUpdated(GeoPoint),
    RunCompleted(Box<SavedRun>),
    /// The forced-stop failure, always `TrackError::PositionUnavailable`.
    SourceFailed(TrackError),
}

struct FeedHandle {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

/// The session state machine: owns the tracking state, the position
/// subscription lifecycle, and the finalize/archive sequence.
///
/// At most one feed task (live watch or simulation) exists at a time; both
/// occupy the same slot, so starting one while the other runs is rejected by
/// the status guard before a second feed could ever be spawned.
#[derive(Clone)]
pub struct SessionController {
    state: Arc<Mutex<SessionCore>>,
    archive: Arc<RunArchive>,
    source: Arc<dyn PositionSource>,
    source_config: SourceConfig,
    feed: Arc<Mutex<Option<FeedHandle>>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(
        source: Arc<dyn PositionSource>,
        archive: Arc<RunArchive>,
        config: SessionConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Arc::new(Mutex::new(SessionCore::new(
                SampleFilter::new(config.filter),
                config.closure_threshold_m,
            ))),
            archive,
            source,
            source_config: config.source,
            feed: Arc::new(Mutex::new(None)),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn archive(&self) -> &RunArchive {
        &self.archive
    }

    pub async fn status(&self) -> TrackingStatus {
        self.state.lock().await.status()
    }

    pub async fn snapshot(&self) -> TrackSnapshot {
        self.state
            .lock()
            .await
            .snapshot(Utc::now().timestamp_millis())
    }

    /// Stopped -> Running: fresh session, fresh subscription.
    pub async fn start(&self) -> Result<TrackSnapshot> {
        let session_id = Uuid::new_v4().to_string();
        {
            let mut state = self.state.lock().await;
            state.begin(session_id.clone(), Utc::now())?;
        }
        info!("session {session_id} started");

        self.spawn_watcher().await;
        Ok(self.emit_state().await)
    }

    /// Running -> Paused: the ledger opens a pause interval and the
    /// subscription is torn down, not merely ignored, so the receiver stops
    /// consuming power and no stale fix can arrive later.
    pub async fn pause(&self) -> Result<TrackSnapshot> {
        {
            let mut state = self.state.lock().await;
            state.pause(Utc::now().timestamp_millis())?;
        }
        self.teardown_feed().await;
        info!("session paused");
        Ok(self.emit_state().await)
    }

    /// Paused -> Running: same watch wiring as `start`, but nothing is reset;
    /// the path, distance and filtering baseline carry straight on.
    pub async fn resume(&self) -> Result<TrackSnapshot> {
        {
            let mut state = self.state.lock().await;
            state.resume(Utc::now().timestamp_millis())?;
        }
        self.spawn_watcher().await;
        info!("session resumed");
        Ok(self.emit_state().await)
    }

    /// Running/Paused -> Stopped: tear down the feed, finalize, detect
    /// territory, archive. A storage failure is returned to the caller, but
    /// only after the run joined the in-memory history.
    pub async fn stop(&self) -> Result<Option<SavedRun>> {
        {
            let state = self.state.lock().await;
            if state.status() == TrackingStatus::Stopped {
                return Err(TrackError::InvalidTransition("stop while already stopped"));
            }
        }
        self.teardown_feed().await;
        let run = finalize_and_archive(&self.state, &self.archive, &self.events).await?;
        info!(
            "session stopped{}",
            match &run {
                Some(run) => format!(": {:.2} km archived", run.distance_km),
                None => String::from(", nothing tracked"),
            }
        );
        Ok(run)
    }

    /// Feed a fixed, trusted path through the pipeline on a cadence, ending
    /// with the same finalize/detect/archive sequence as `stop`. Rejected
    /// while any session (live or simulated) is active.
    pub async fn simulate(&self, path: Vec<GeoPoint>, step: Duration) -> Result<()> {
        let session_id = Uuid::new_v4().to_string();
        {
            let mut state = self.state.lock().await;
            state.begin(session_id.clone(), Utc::now())?;
        }
        info!("simulation {session_id} started: {} points", path.len());

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(simulation_loop(
            Arc::clone(&self.state),
            Arc::clone(&self.archive),
            self.events.clone(),
            path,
            step,
            cancel.clone(),
        ));
        self.install_feed(FeedHandle { handle, cancel }).await;
        self.emit_state().await;
        Ok(())
    }

    /// One spawn path shared by `start` and `resume`: only `begin` vs.
    /// `resume` on the core differs, never the watch wiring.
    async fn spawn_watcher(&self) {
        let positions = self.source.subscribe(self.source_config);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(watch_loop(
            Arc::clone(&self.state),
            Arc::clone(&self.archive),
            self.events.clone(),
            positions,
            cancel.clone(),
        ));
        self.install_feed(FeedHandle { handle, cancel }).await;
    }

    async fn install_feed(&self, feed: FeedHandle) {
        let mut slot = self.feed.lock().await;
        if let Some(stale) = slot.take() {
            // Only a finished feed can still be here; the status guards keep
            // two live feeds from ever coexisting.
            stale.cancel.cancel();
            stale.handle.abort();
        }
        *slot = Some(feed);
    }

    /// Cancel the active feed and wait for it to finish. Joining, not just
    /// signalling, is what guarantees no event lands after the transition.
    async fn teardown_feed(&self) {
        let feed = self.feed.lock().await.take();
        if let Some(FeedHandle { handle, cancel }) = feed {
            cancel.cancel();
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    error!("feed task failed to join: {err}");
                }
            }
        }
    }

    async fn emit_state(&self) -> TrackSnapshot {
        let snapshot = self.snapshot().await;
        let _ = self.events.send(SessionEvent::StateChanged(snapshot.clone()));
        snapshot
    }
}

/// Close out the active session and archive the result.
///
/// Shared by `stop`, the watch loop's source-failure path, and simulation
/// completion. The run enters the in-memory history before the persist; a
/// failed persist surfaces as a storage error without undoing that.
pub(crate) async fn finalize_and_archive(
    state: &Mutex<SessionCore>,
    archive: &RunArchive,
    events: &broadcast::Sender<SessionEvent>,
) -> Result<Option<SavedRun>> {
    let run = { state.lock().await.finalize(Utc::now())? };

    let mut storage_failure = None;
    if let Some(run) = &run {
        if let Err(err) = archive.append(run.clone()) {
            error!("failed to persist run {}: {err}", run.id);
            storage_failure = Some(err);
        }
        let _ = events.send(SessionEvent::RunCompleted(Box::new(run.clone())));
    }

    let snapshot = {
        state
            .lock()
            .await
            .snapshot(Utc::now().timestamp_millis())
    };
    let _ = events.send(SessionEvent::StateChanged(snapshot));

    match storage_failure {
        Some(err) => Err(err),
        None => Ok(run),
    }
}
