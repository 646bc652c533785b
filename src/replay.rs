//! Offline replay of recorded fixes through a [`TrackSession`], for tuning
//! the gate, noise floor and smoothing against real logs.

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::config::TrackerConfig;
use crate::error::TrackerResult;
use crate::sensors::GeoFix;
use crate::session::{FixOutcome, TrackSession};

/// Recorded session log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayLog {
    pub fixes: Vec<GeoFix>,
}

/// Load a `{"fixes": [...]}` log, gzipped if the extension is `.gz`
pub fn load_log(path: &Path) -> TrackerResult<ReplayLog> {
    let file = File::open(path)?;
    if path.extension().map(|e| e == "gz").unwrap_or(false) {
        let gz = GzDecoder::new(file);
        let reader = BufReader::new(gz);
        Ok(serde_json::from_reader(reader)?)
    } else {
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub total_fixes: usize,
    pub accepted: u64,
    pub low_accuracy: u64,
    /// Accepted steps dropped under the noise floor
    pub sub_floor_steps: u64,
    pub distance_m: f64,
    pub elapsed_seconds: u64,
    /// Speed estimate just before stop (stop clears the history)
    pub final_speed_mps: f64,
    pub peak_speed_mps: f64,
}

/// Run `fixes` through a fresh session.
///
/// Clock ticks are synthesized from fix timestamps: one per whole second
/// elapsed since the first fix. Timestamps that go backwards add no ticks.
pub fn replay(config: &TrackerConfig, fixes: &[GeoFix]) -> ReplaySummary {
    let mut session = TrackSession::new(config);
    session.start();

    let start_ts = fixes.first().map(|f| f.timestamp).unwrap_or(0.0);
    let mut sub_floor_steps = 0u64;
    let mut peak_speed_mps: f64 = 0.0;

    for fix in fixes {
        let target = (fix.timestamp - start_ts).max(0.0).floor() as u64;
        while session.elapsed_seconds() < target {
            session.tick();
        }

        if let FixOutcome::Accepted { delta_m, counted: false } = session.on_fix(fix) {
            if delta_m > 0.0 {
                sub_floor_steps += 1;
            }
        }
        peak_speed_mps = peak_speed_mps.max(session.current_speed_mps());
    }

    let final_speed_mps = session.current_speed_mps();
    session.stop();
    let counters = session.counters();

    ReplaySummary {
        total_fixes: fixes.len(),
        accepted: counters.accepted,
        low_accuracy: counters.low_accuracy,
        sub_floor_steps,
        distance_m: session.current_distance_meters(),
        elapsed_seconds: session.elapsed_seconds(),
        final_speed_mps,
        peak_speed_mps,
    }
}
