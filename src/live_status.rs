use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::distance::Position;
use crate::sensors::current_timestamp;
use crate::session::{SessionSnapshot, SessionState};

/// Status file consumed by external dashboards
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LiveStatus {
    pub timestamp: f64,
    pub state: SessionState,
    pub status: String,
    pub status_message: Option<String>,
    pub speed_mps: f64,
    pub distance_m: f64,
    pub elapsed_seconds: u64,
    // Fix counters
    pub fixes_accepted: u64,
    pub fixes_low_accuracy: u64,
    pub sensing_errors: u64,
    pub last_position: Option<Position>,
}

impl LiveStatus {
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        let status_message = match &snapshot.status {
            crate::session::TrackStatus::SensingError(message) => Some(message.clone()),
            _ => None,
        };

        Self {
            timestamp: current_timestamp(),
            state: snapshot.state,
            status: snapshot.status.label().to_string(),
            status_message,
            speed_mps: snapshot.speed_mps,
            distance_m: snapshot.distance_m,
            elapsed_seconds: snapshot.elapsed_seconds,
            fixes_accepted: snapshot.counters.accepted,
            fixes_low_accuracy: snapshot.counters.low_accuracy,
            sensing_errors: snapshot.counters.sensing_errors,
            last_position: snapshot.last_position,
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
