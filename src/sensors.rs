use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::mpsc::Sender;
use tokio::time::{interval, Duration, Interval, MissedTickBehavior};

use crate::distance::Position;

/// One location sample as reported by the provider
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Instantaneous speed in m/s, if the provider reported one
    #[serde(default)]
    pub speed: Option<f64>,
    /// Self-reported uncertainty radius in meters
    pub accuracy: f64,
    /// Unix seconds
    pub timestamp: f64,
}

impl GeoFix {
    pub fn new(latitude: f64, longitude: f64, speed: Option<f64>, accuracy: f64, timestamp: f64) -> Self {
        Self {
            latitude,
            longitude,
            speed,
            accuracy,
            timestamp,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }
}

/// What a location subscription yields
#[derive(Clone, Debug, PartialEq)]
pub enum LocationEvent {
    Fix(GeoFix),
    /// Per-event failure (timeout, permission revoked, bad input line)
    Error(String),
}

/// A subscription to a location provider.
///
/// `None` means the provider has ended and will produce nothing further.
pub trait LocationSource {
    fn next_event(&mut self) -> impl Future<Output = Option<LocationEvent>> + Send;
}

/// Forward events from `source` into `tx` until either side goes away.
///
/// Dropping the receiving end unsubscribes: the loop notices the closed
/// channel even while waiting on the provider.
pub async fn location_loop<S: LocationSource>(mut source: S, tx: Sender<LocationEvent>) {
    let mut event_count = 0u64;

    loop {
        let event = tokio::select! {
            _ = tx.closed() => {
                debug!("[gps] Receiver dropped after {} events", event_count);
                break;
            }
            event = source.next_event() => event,
        };

        let Some(event) = event else {
            debug!("[gps] Source ended after {} events", event_count);
            break;
        };

        if tx.send(event).await.is_err() {
            debug!("[gps] Channel closed after {} events", event_count);
            break;
        }
        event_count += 1;
    }
}

/// Synthetic walk for demos and soak runs.
///
/// Moves north-east in small steps with oscillating speed and accuracy, and
/// degrades accuracy on every `degrade_every`-th fix so the accuracy gate gets
/// exercised.
pub struct MockLocationSource {
    interval: Interval,
    seq: u64,
    degrade_every: u64,
    origin: Position,
}

impl MockLocationSource {
    pub fn new(period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            seq: 0,
            degrade_every: 15,
            origin: Position::new(37.7749, -122.4194),
        }
    }

    pub fn with_origin(mut self, origin: Position) -> Self {
        self.origin = origin;
        self
    }

    fn make_fix(&mut self) -> GeoFix {
        let seq = self.seq as f64;
        self.seq += 1;

        let accuracy = if self.degrade_every > 0 && self.seq % self.degrade_every == 0 {
            35.0
        } else {
            5.0 + (seq * 0.1).sin() * 2.0
        };

        GeoFix {
            latitude: self.origin.latitude + seq * 0.00001,
            longitude: self.origin.longitude + seq * 0.00001,
            speed: Some(10.0 + (seq * 0.5).sin() * 5.0),
            accuracy,
            timestamp: current_timestamp(),
        }
    }
}

impl LocationSource for MockLocationSource {
    async fn next_event(&mut self) -> Option<LocationEvent> {
        self.interval.tick().await;
        Some(LocationEvent::Fix(self.make_fix()))
    }
}

/// Reads one JSON `GeoFix` per line, e.g. piped from a phone's location API.
///
/// Blank lines are skipped; malformed lines become `LocationEvent::Error` and
/// reading continues. A read error is reported once and ends the stream.
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
    finished: bool,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            finished: false,
        }
    }
}

impl<R: AsyncBufRead + Unpin + Send> LocationSource for JsonLinesSource<R> {
    async fn next_event(&mut self) -> Option<LocationEvent> {
        if self.finished {
            return None;
        }

        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    return Some(match serde_json::from_str::<GeoFix>(line) {
                        Ok(fix) => LocationEvent::Fix(fix),
                        Err(e) => {
                            warn!("[gps] Malformed fix line: {}", e);
                            LocationEvent::Error(format!("malformed fix: {e}"))
                        }
                    });
                }
                Ok(None) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(LocationEvent::Error(format!("read failed: {e}")));
                }
            }
        }
    }
}

pub fn current_timestamp() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;
    use tokio::sync::mpsc;

    #[test]
    fn test_fix_json_without_speed() {
        let fix: GeoFix =
            serde_json::from_str(r#"{"latitude":1.0,"longitude":2.0,"accuracy":4.0,"timestamp":10.0}"#)
                .unwrap();
        assert_eq!(fix.speed, None);
        assert_eq!(fix.position(), Position::new(1.0, 2.0));
    }

    #[tokio::test]
    async fn test_json_lines_source() {
        let input = concat!(
            r#"{"latitude":0.0,"longitude":0.0,"speed":5.0,"accuracy":5.0,"timestamp":1.0}"#,
            "\n\n",
            "not json\n",
            r#"{"latitude":0.0,"longitude":0.001,"accuracy":5.0,"timestamp":2.0}"#,
            "\n",
        );
        let mut source = JsonLinesSource::new(BufReader::new(input.as_bytes()));

        match source.next_event().await {
            Some(LocationEvent::Fix(fix)) => assert_eq!(fix.speed, Some(5.0)),
            other => panic!("expected fix, got {other:?}"),
        }
        assert!(matches!(source.next_event().await, Some(LocationEvent::Error(_))));
        match source.next_event().await {
            Some(LocationEvent::Fix(fix)) => assert_eq!(fix.longitude, 0.001),
            other => panic!("expected fix, got {other:?}"),
        }
        assert_eq!(source.next_event().await, None);
        assert_eq!(source.next_event().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_source_degrades_accuracy() {
        let mut source = MockLocationSource::new(Duration::from_secs(1));
        let mut poor = 0;
        for _ in 0..30 {
            if let Some(LocationEvent::Fix(fix)) = source.next_event().await {
                if fix.accuracy > 20.0 {
                    poor += 1;
                }
            }
        }
        assert_eq!(poor, 2);
    }

    #[tokio::test]
    async fn test_location_loop_forwards_until_end() {
        let input = concat!(
            r#"{"latitude":0.0,"longitude":0.0,"accuracy":5.0,"timestamp":1.0}"#,
            "\n",
            r#"{"latitude":0.0,"longitude":0.0,"accuracy":5.0,"timestamp":2.0}"#,
            "\n",
        );
        let source = JsonLinesSource::new(BufReader::new(input.as_bytes()));
        let (tx, mut rx) = mpsc::channel(8);

        location_loop(source, tx).await;

        let mut count = 0;
        while let Some(event) = rx.recv().await {
            assert!(matches!(event, LocationEvent::Fix(_)));
            count += 1;
        }
        assert_eq!(count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_location_loop_stops_when_receiver_dropped() {
        let source = MockLocationSource::new(Duration::from_secs(1));
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(location_loop(source, tx));

        drop(rx);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("loop should exit")
            .unwrap();
    }
}
