//! Demo shell: replays a scripted run through the live pipeline, then a
//! simulated loop, and prints the resulting history.
//!
//! Run with `RUST_LOG=info cargo run --bin trailclaim-sim`.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use trailclaim::{
    format_history, GeoPoint, GeoSample, JsonFileStore, RunArchive, ScriptedSource,
    SessionConfig, SessionController, SessionEvent,
};

/// A city-block loop: out, around, and back to the start.
fn block_loop() -> Vec<GeoPoint> {
    vec![
        GeoPoint::new(52.5200, 13.4050),
        GeoPoint::new(52.5210, 13.4050),
        GeoPoint::new(52.5220, 13.4050),
        GeoPoint::new(52.5220, 13.4065),
        GeoPoint::new(52.5220, 13.4080),
        GeoPoint::new(52.5210, 13.4080),
        GeoPoint::new(52.5200, 13.4080),
        GeoPoint::new(52.5200, 13.4065),
        GeoPoint::new(52.5200, 13.4050),
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let data_dir = std::env::temp_dir().join("trailclaim-demo");
    let archive = Arc::new(RunArchive::new(Box::new(JsonFileStore::new(data_dir)?)));
    if let Err(err) = archive.load_all() {
        log::warn!("starting with an empty history: {err}");
    }

    // The "live" session replays a scripted fix stream, noise included.
    let samples: Vec<GeoSample> = block_loop()
        .into_iter()
        .enumerate()
        .map(|(i, point)| GeoSample::new(point, 8.0, i as i64 * 20_000))
        .collect();
    let source = Arc::new(ScriptedSource::new(samples, Duration::from_millis(50)));

    let controller = SessionController::new(source, Arc::clone(&archive), SessionConfig::default());
    let mut events = controller.subscribe();

    controller.start().await?;
    while let Ok(event) = events.recv().await {
        match event {
            SessionEvent::PositionUpdated(point) => {
                let snapshot = controller.snapshot().await;
                println!(
                    "fix ({:.4}, {:.4})  {:.3} km  heading {:>5.1}°",
                    point.latitude,
                    point.longitude,
                    snapshot.distance_km,
                    snapshot.heading_deg
                );
                if snapshot.path.len() >= 9 {
                    break;
                }
            }
            SessionEvent::SourceFailed(failure) => return Err(failure.into()),
            _ => {}
        }
    }
    let run = controller
        .stop()
        .await?
        .context("live session produced no run")?;
    println!(
        "live run: {:.2} km, {} territories\n",
        run.distance_km,
        run.captured_areas.len()
    );

    // Same pipeline again, driven by the simulation feed. Fresh subscription,
    // so the live session's trailing events are not replayed here.
    let mut events = controller.subscribe();
    controller
        .simulate(block_loop(), Duration::from_millis(20))
        .await?;
    while let Ok(event) = events.recv().await {
        if let SessionEvent::RunCompleted(run) = event {
            println!(
                "simulated run: {:.2} km, {} territories\n",
                run.distance_km,
                run.captured_areas.len()
            );
            break;
        }
    }

    print!("{}", format_history(&archive.runs()));
    Ok(())
}
