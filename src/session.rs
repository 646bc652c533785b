use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::accuracy::AccuracyGate;
use crate::clock::SessionClock;
use crate::config::TrackerConfig;
use crate::distance::Position;
use crate::sensors::GeoFix;
use crate::smoothing::SpeedSmoother;

/// Session state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Never started
    Idle,
    /// Accumulating fixes and ticks
    Running,
    /// Stopped; final values stay readable
    Stopped,
}

/// Quality signal for rendering collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "kebab-case")]
pub enum TrackStatus {
    Idle,
    TrackingActive,
    LowAccuracy,
    SensingError(String),
    Stopped,
}

impl TrackStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TrackStatus::Idle => "idle",
            TrackStatus::TrackingActive => "tracking-active",
            TrackStatus::LowAccuracy => "low-accuracy",
            TrackStatus::SensingError(_) => "sensing-error",
            TrackStatus::Stopped => "stopped",
        }
    }
}

/// What `TrackSession::on_fix` did with a fix
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixOutcome {
    /// Session not running; fix dropped
    Ignored,
    /// Accuracy gate rejected the fix; nothing changed
    LowAccuracy,
    /// Fix applied. `delta_m` is the step from the previous base point
    /// (0 for the first fix); `counted` is false when it fell under the noise floor.
    Accepted { delta_m: f64, counted: bool },
}

/// Per-session fix counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixCounters {
    pub accepted: u64,
    pub low_accuracy: u64,
    pub sensing_errors: u64,
}

/// Readable bundle of the derived metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub status: TrackStatus,
    pub speed_mps: f64,
    pub distance_m: f64,
    pub elapsed_seconds: u64,
    pub last_position: Option<Position>,
    pub counters: FixCounters,
}

/// Owns everything derived from the fix stream: distance, base point,
/// speed smoother and clock.
pub struct TrackSession {
    state: SessionState,
    status: TrackStatus,
    gate: AccuracyGate,
    smoother: SpeedSmoother,
    clock: SessionClock,
    noise_floor_m: f64,
    distance_m: f64,
    last_position: Option<Position>,
    counters: FixCounters,
}

impl TrackSession {
    /// Create new session in Idle state
    pub fn new(config: &TrackerConfig) -> Self {
        TrackSession {
            state: SessionState::Idle,
            status: TrackStatus::Idle,
            gate: AccuracyGate::new(config.max_accuracy_m),
            smoother: SpeedSmoother::new(config.smoothing_alpha, config.smoothing_window),
            clock: SessionClock::new(),
            noise_floor_m: config.noise_floor_m,
            distance_m: 0.0,
            last_position: None,
            counters: FixCounters::default(),
        }
    }

    /// Begin a fresh session. Calling this while running discards the
    /// current session.
    pub fn start(&mut self) {
        if self.state == SessionState::Running {
            warn!("[session] start() while running, resetting session");
        }

        self.distance_m = 0.0;
        self.last_position = None;
        self.counters = FixCounters::default();
        self.smoother.reset();
        self.clock.reset();
        self.clock.start();
        self.state = SessionState::Running;
        self.status = TrackStatus::TrackingActive;

        info!("[session] Tracking started");
    }

    /// Freeze distance and elapsed time; clear speed history.
    pub fn stop(&mut self) {
        if self.state != SessionState::Running {
            return;
        }

        self.clock.stop();
        self.smoother.reset();
        self.state = SessionState::Stopped;
        self.status = TrackStatus::Stopped;

        info!(
            "[session] Tracking stopped: {:.1} m in {} s ({} fixes, {} low accuracy)",
            self.distance_m,
            self.clock.elapsed_seconds(),
            self.counters.accepted,
            self.counters.low_accuracy
        );
    }

    /// Apply one location fix. Untrusted fixes are discarded whole.
    pub fn on_fix(&mut self, fix: &GeoFix) -> FixOutcome {
        if !self.is_running() {
            return FixOutcome::Ignored;
        }

        if !self.gate.accept(fix.accuracy) {
            self.counters.low_accuracy += 1;
            self.status = TrackStatus::LowAccuracy;
            warn!(
                "[session] Low accuracy fix ({:.1} m > {:.1} m), waiting for a better signal",
                fix.accuracy,
                self.gate.max_accuracy_m()
            );
            return FixOutcome::LowAccuracy;
        }

        let position = fix.position();
        let mut delta_m = 0.0;
        let mut counted = false;

        if let Some(last) = self.last_position {
            delta_m = last.distance_to(&position);
            if delta_m > self.noise_floor_m {
                self.distance_m += delta_m;
                counted = true;
            }
        }
        // Base point always advances, even when the step was dropped as jitter
        self.last_position = Some(position);

        let speed = self.smoother.update(fix.speed);
        self.counters.accepted += 1;
        self.status = TrackStatus::TrackingActive;

        debug!(
            "[session] Fix accepted: step {:.2} m (counted={}), total {:.1} m, speed {:.2} m/s",
            delta_m, counted, self.distance_m, speed
        );

        FixOutcome::Accepted { delta_m, counted }
    }

    /// Record a per-event failure from the location source. The session
    /// keeps running and recovers on the next accepted fix.
    pub fn on_sensing_error(&mut self, message: &str) {
        if !self.is_running() {
            return;
        }
        self.counters.sensing_errors += 1;
        self.status = TrackStatus::SensingError(message.to_string());
        warn!("[session] GPS error: {}", message);
    }

    /// One-second clock tick
    pub fn tick(&mut self) {
        if self.is_running() {
            self.clock.tick();
        }
    }

    pub fn current_distance_meters(&self) -> f64 {
        self.distance_m
    }

    pub fn current_speed_mps(&self) -> f64 {
        self.smoother.current_estimate()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.clock.elapsed_seconds()
    }

    pub fn status(&self) -> &TrackStatus {
        &self.status
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn last_position(&self) -> Option<Position> {
        self.last_position
    }

    pub fn counters(&self) -> FixCounters {
        self.counters
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            status: self.status.clone(),
            speed_mps: self.current_speed_mps(),
            distance_m: self.distance_m,
            elapsed_seconds: self.elapsed_seconds(),
            last_position: self.last_position,
            counters: self.counters,
        }
    }
}

impl Default for TrackSession {
    fn default() -> Self {
        Self::new(&TrackerConfig::default())
    }
}
