//! Run history: an append-only collection persisted through a key-value store.
//!
//! The storage collaborator only knows strings: the whole collection lives
//! under one fixed key as a single JSON array, rewritten on every append.

use std::{collections::HashMap, fs, path::PathBuf, sync::RwLock};

use log::{info, warn};

use crate::{
    error::{Result, TrackError},
    models::SavedRun,
};

/// The single key holding the serialized run collection.
pub const RUNS_KEY: &str = "trailclaim.runs";

/// String key-value persistence, the only surface the archive relies on.
pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// One JSON file per key under a base directory.
pub struct JsonFileStore {
    base_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)
            .map_err(|err| TrackError::Storage(format!("create {}: {err}", base_dir.display())))?;
        Ok(Self { base_dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|err| TrackError::Storage(format!("read {}: {err}", path.display())))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        fs::write(&path, value)
            .map_err(|err| TrackError::Storage(format!("write {}: {err}", path.display())))
    }
}

/// In-memory store for tests and the demo binary.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().unwrap().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The persisted run collection plus its in-memory mirror.
///
/// Append semantics are at-least-attempt, not guaranteed-durable: the run is
/// added to the in-memory list before the write, and a failed write surfaces
/// a storage error without dropping the run the UI is already showing.
pub struct RunArchive {
    store: Box<dyn KeyValueStore>,
    runs: RwLock<Vec<SavedRun>>,
}

impl RunArchive {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store,
            runs: RwLock::new(Vec::new()),
        }
    }

    /// Read the whole collection from the store, typically once at startup.
    ///
    /// A missing key is an empty history. A malformed payload fails with a
    /// storage error and leaves the in-memory list empty, never partially
    /// populated.
    pub fn load_all(&self) -> Result<Vec<SavedRun>> {
        let raw = match self.store.read(RUNS_KEY) {
            Ok(raw) => raw,
            Err(err) => {
                self.runs.write().unwrap().clear();
                return Err(err);
            }
        };

        let loaded = match raw {
            Some(raw) => match serde_json::from_str::<Vec<SavedRun>>(&raw) {
                Ok(runs) => runs,
                Err(err) => {
                    self.runs.write().unwrap().clear();
                    return Err(TrackError::Storage(format!(
                        "malformed run collection: {err}"
                    )));
                }
            },
            None => Vec::new(),
        };

        info!("loaded {} saved runs", loaded.len());
        let mut guard = self.runs.write().unwrap();
        *guard = loaded;
        Ok(guard.clone())
    }

    /// Append a finished run and rewrite the whole persisted collection.
    pub fn append(&self, run: SavedRun) -> Result<()> {
        let serialized = {
            let mut guard = self.runs.write().unwrap();
            guard.push(run);
            serde_json::to_string(&*guard)?
        };

        if let Err(err) = self.store.write(RUNS_KEY, &serialized) {
            warn!("run kept in memory but failed to persist: {err}");
            return Err(err);
        }
        Ok(())
    }

    /// Snapshot of the in-memory collection, insertion order.
    pub fn runs(&self) -> Vec<SavedRun> {
        self.runs.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.runs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.read().unwrap().is_empty()
    }
}

/// Plain-text history summary for external sharing.
///
/// Pure formatter over the records; it reads nothing and mutates nothing.
pub fn format_history(runs: &[SavedRun]) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    let _ = writeln!(out, "Run history ({} runs)", runs.len());

    let mut total_km = 0.0;
    let mut total_active_s = 0i64;
    for run in runs {
        total_km += run.distance_km;
        total_active_s += run.active_duration_seconds;
        let _ = writeln!(
            out,
            "{} | {:.2} km | active {} | total {} | {} pauses ({}) | {} territories",
            run.date_iso,
            run.distance_km,
            format_duration(run.active_duration_seconds),
            format_duration(run.total_duration_seconds),
            run.pause_count,
            format_duration(run.pause_duration_seconds),
            run.captured_areas.len(),
        );
    }

    let _ = writeln!(
        out,
        "Totals: {:.2} km over {}",
        total_km,
        format_duration(total_active_s)
    );
    out
}

fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60, seconds % 60)
}
