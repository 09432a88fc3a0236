//! trailclaim: a run-tracking session engine with closed-loop territory
//! capture.
//!
//! The engine ingests a noisy stream of position fixes, filters them,
//! accumulates a path with live distance, keeps pause-aware time, and on stop
//! decides whether the path closed into captured territory before archiving
//! the run. Map rendering, real positioning hardware and the storage medium
//! are collaborators behind small interfaces ([`source::PositionSource`],
//! [`archive::KeyValueStore`], the [`SessionEvent`] broadcast).

pub mod archive;
pub mod error;
pub mod filter;
pub mod geo;
pub mod models;
pub mod session;
pub mod source;
pub mod territory;
pub mod track;

pub use archive::{format_history, JsonFileStore, KeyValueStore, MemoryStore, RunArchive};
pub use error::TrackError;
pub use filter::{FilterConfig, SampleFilter};
pub use geo::{GeoPoint, GeoSample};
pub use models::{CapturedArea, SavedRun};
pub use session::{
    SessionConfig, SessionController, SessionEvent, TrackSnapshot, TrackingStatus,
};
pub use source::{PositionEvent, PositionSource, ScriptedSource, SourceConfig};
