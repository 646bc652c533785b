//! Speed, distance and duration from a noisy stream of location fixes.
//!
//! Fixes pass an accuracy gate, accepted positions accumulate great-circle
//! distance above a noise floor, and reported speeds are exponentially
//! smoothed then averaged over a short window. Elapsed time is counted from
//! an independent one-second tick.

pub mod accuracy;
pub mod clock;
pub mod config;
pub mod distance;
pub mod error;
pub mod live_status;
pub mod replay;
pub mod sensors;
pub mod session;
pub mod smoothing;
pub mod tracker;
pub mod units;

pub use accuracy::AccuracyGate;
pub use clock::SessionClock;
pub use config::TrackerConfig;
pub use distance::{haversine_distance, Position};
pub use error::{TrackerError, TrackerResult};
pub use sensors::{GeoFix, LocationEvent, LocationSource};
pub use session::{FixOutcome, SessionSnapshot, SessionState, TrackSession, TrackStatus};
pub use smoothing::SpeedSmoother;
pub use tracker::{spawn_tracker, subscribe, TrackerHandle};
