//! Async driver that feeds a [`TrackSession`] from a location subscription
//! and a periodic clock.
//!
//! A single task owns the session, so fixes, ticks and the stop request are
//! applied one at a time and never interleave mid-update. Stop is checked
//! first on every wakeup; once it is seen the session is frozen and the event
//! receiver is dropped, which unsubscribes the source.

use log::{debug, info, warn};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant};

use crate::config::TrackerConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::live_status::LiveStatus;
use crate::sensors::{location_loop, LocationEvent, LocationSource};
use crate::session::{SessionSnapshot, TrackSession};

/// Buffered location events between the source and the session task
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Spawn `location_loop` for `source` and return the receiving end
pub fn subscribe<S>(source: S) -> mpsc::Receiver<LocationEvent>
where
    S: LocationSource + Send + 'static,
{
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    tokio::spawn(location_loop(source, tx));
    rx
}

/// Handle to a running tracker task
pub struct TrackerHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    snapshots: watch::Receiver<SessionSnapshot>,
    source_open: watch::Receiver<bool>,
    task: JoinHandle<SessionSnapshot>,
}

impl TrackerHandle {
    /// Latest published metrics
    pub fn latest(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Subscribe to metric updates, published after every event
    pub fn snapshots(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Resolves once the location source has ended. The session keeps
    /// running (the clock still ticks) until stopped.
    pub async fn source_ended(&self) {
        let mut source_open = self.source_open.clone();
        let _ = source_open.wait_for(|open| !*open).await;
    }

    /// Stop tracking and return the frozen final metrics
    pub async fn stop(mut self) -> TrackerResult<SessionSnapshot> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        self.task
            .await
            .map_err(|e| TrackerError::TaskFailed(e.to_string()))
    }
}

/// Start a session and drive it from `events` and a clock ticking every
/// `config.tick_interval_ms`.
///
/// `None` means no location capability exists, which is fatal to starting.
/// Must be called from within a tokio runtime.
pub fn spawn_tracker(
    config: TrackerConfig,
    events: Option<mpsc::Receiver<LocationEvent>>,
) -> TrackerResult<TrackerHandle> {
    config.validate()?;
    let events = events.ok_or(TrackerError::SensingUnavailable)?;

    let mut session = TrackSession::new(&config);
    session.start();

    let (stop_tx, stop_rx) = oneshot::channel();
    let (snapshot_tx, snapshots) = watch::channel(session.snapshot());
    let (source_tx, source_open) = watch::channel(true);

    let task = tokio::spawn(run_session(
        config,
        session,
        events,
        stop_rx,
        snapshot_tx,
        source_tx,
    ));

    Ok(TrackerHandle {
        stop_tx: Some(stop_tx),
        snapshots,
        source_open,
        task,
    })
}

async fn run_session(
    config: TrackerConfig,
    mut session: TrackSession,
    mut events: mpsc::Receiver<LocationEvent>,
    mut stop_rx: oneshot::Receiver<()>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    source_tx: watch::Sender<bool>,
) -> SessionSnapshot {
    let period = Duration::from_millis(config.tick_interval_ms);
    let mut ticker = interval_at(Instant::now() + period, period);
    let mut source_open = true;

    loop {
        tokio::select! {
            biased;

            // A dropped handle counts as a stop request
            _ = &mut stop_rx => break,

            event = events.recv(), if source_open => match event {
                Some(LocationEvent::Fix(fix)) => {
                    session.on_fix(&fix);
                }
                Some(LocationEvent::Error(message)) => {
                    session.on_sensing_error(&message);
                }
                None => {
                    info!("[tracker] Location source ended");
                    source_open = false;
                    source_tx.send_replace(false);
                }
            },

            _ = ticker.tick() => {
                session.tick();
                write_status(&config, &session);
            }
        }

        snapshot_tx.send_replace(session.snapshot());
    }

    session.stop();
    drop(events);
    debug!("[tracker] Unsubscribed from location source");

    let final_snapshot = session.snapshot();
    snapshot_tx.send_replace(final_snapshot.clone());
    write_status(&config, &session);
    final_snapshot
}

fn write_status(config: &TrackerConfig, session: &TrackSession) {
    if let Some(path) = &config.status_path {
        if let Err(e) = LiveStatus::from_snapshot(&session.snapshot()).save(path) {
            warn!("[tracker] Failed to write status to {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{GeoFix, JsonLinesSource};
    use crate::session::{SessionState, TrackStatus};
    use approx::assert_relative_eq;
    use tokio::io::BufReader;
    use tokio::time::sleep;

    fn fix(lat: f64, lon: f64, speed: f64, accuracy: f64) -> LocationEvent {
        LocationEvent::Fix(GeoFix::new(lat, lon, Some(speed), accuracy, 0.0))
    }

    #[tokio::test]
    async fn test_no_source_is_fatal() {
        let result = spawn_tracker(TrackerConfig::default(), None);
        assert!(matches!(result, Err(TrackerError::SensingUnavailable)));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let (_tx, rx) = mpsc::channel(1);
        let config = TrackerConfig {
            smoothing_window: 0,
            ..TrackerConfig::default()
        };
        assert!(matches!(
            spawn_tracker(config, Some(rx)),
            Err(TrackerError::Config(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixes_and_ticks() {
        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_tracker(TrackerConfig::default(), Some(rx)).unwrap();

        tx.send(fix(0.0, 0.0, 5.0, 5.0)).await.unwrap();
        tx.send(fix(0.0, 0.001, 5.0, 5.0)).await.unwrap();
        tx.send(fix(0.0, 0.5, 5.0, 40.0)).await.unwrap();
        sleep(Duration::from_millis(3500)).await;

        let live = handle.latest();
        assert_eq!(live.state, SessionState::Running);
        assert_eq!(live.elapsed_seconds, 3);
        assert_eq!(live.status, TrackStatus::LowAccuracy);

        let snapshot = handle.stop().await.unwrap();
        assert_eq!(snapshot.state, SessionState::Stopped);
        assert_eq!(snapshot.status, TrackStatus::Stopped);
        assert_eq!(snapshot.elapsed_seconds, 3);
        assert_relative_eq!(snapshot.distance_m, 111.195, epsilon = 0.1);
        assert_eq!(snapshot.counters.accepted, 2);
        assert_eq!(snapshot.counters.low_accuracy, 1);
        // Speed history is cleared on stop
        assert_eq!(snapshot.speed_mps, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_unsubscribes() {
        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_tracker(TrackerConfig::default(), Some(rx)).unwrap();
        let snapshot = handle.stop().await.unwrap();

        assert_eq!(snapshot.distance_m, 0.0);
        assert_eq!(snapshot.speed_mps, 0.0);
        assert_eq!(snapshot.elapsed_seconds, 0);
        // Receiver is gone; late fixes can't reach the session
        assert!(tx.send(fix(0.0, 0.001, 5.0, 5.0)).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sensing_error_is_not_fatal() {
        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_tracker(TrackerConfig::default(), Some(rx)).unwrap();
        let mut updates = handle.snapshots();

        tx.send(LocationEvent::Error("timeout".to_string())).await.unwrap();
        updates.changed().await.unwrap();
        assert_eq!(
            updates.borrow().status,
            TrackStatus::SensingError("timeout".to_string())
        );

        tx.send(fix(0.0, 0.0, 2.0, 5.0)).await.unwrap();
        updates.changed().await.unwrap();
        assert_eq!(updates.borrow().status, TrackStatus::TrackingActive);

        let snapshot = handle.stop().await.unwrap();
        assert_eq!(snapshot.counters.sensing_errors, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_end_keeps_clock_running() {
        let input = concat!(
            r#"{"latitude":0.0,"longitude":0.0,"speed":4.0,"accuracy":5.0,"timestamp":1.0}"#,
            "\n",
            r#"{"latitude":0.0,"longitude":0.001,"speed":4.0,"accuracy":5.0,"timestamp":2.0}"#,
            "\n",
        );
        let events = subscribe(JsonLinesSource::new(BufReader::new(input.as_bytes())));
        let handle = spawn_tracker(TrackerConfig::default(), Some(events)).unwrap();

        handle.source_ended().await;
        sleep(Duration::from_millis(2500)).await;

        let snapshot = handle.stop().await.unwrap();
        assert_eq!(snapshot.counters.accepted, 2);
        assert_eq!(snapshot.elapsed_seconds, 2);
        assert!(snapshot.distance_m > 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_file_written_on_tick() {
        let path = std::env::temp_dir().join(format!("track_meter_tracker_{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let config = TrackerConfig {
            status_path: Some(path.clone()),
            ..TrackerConfig::default()
        };

        let (_tx, rx) = mpsc::channel(8);
        let handle = spawn_tracker(config, Some(rx)).unwrap();
        sleep(Duration::from_millis(1500)).await;
        handle.stop().await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let status: LiveStatus = serde_json::from_str(&text).unwrap();
        assert_eq!(status.status, "stopped");
        assert_eq!(status.elapsed_seconds, 1);

        let _ = std::fs::remove_file(&path);
    }
}
