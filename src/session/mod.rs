pub mod clock;
pub mod controller;
pub mod state;

mod simulate;
mod watcher;

pub use clock::{ClockSummary, SessionClock};
pub use controller::{SessionConfig, SessionController, SessionEvent};
pub use state::{TrackSnapshot, TrackingStatus};
