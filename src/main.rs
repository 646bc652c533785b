use anyhow::Result;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tokio::io::BufReader;
use tokio::time::{sleep, Duration};

use track_meter_rs::sensors::{JsonLinesSource, MockLocationSource};
use track_meter_rs::units::{format_elapsed, DisplayUnits, SpeedBand};
use track_meter_rs::{spawn_tracker, subscribe, SessionSnapshot, TrackerConfig};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// Synthetic walk
    Mock,
    /// One JSON fix per line on stdin
    Stdin,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum UnitsArg {
    Metric,
    Imperial,
}

#[derive(Parser, Debug)]
#[command(name = "track_meter")]
#[command(about = "Live speed / distance / duration from a stream of location fixes", long_about = None)]
struct Args {
    /// Duration in seconds (0 = until Ctrl-C or end of input)
    #[arg(value_name = "SECONDS", default_value = "0")]
    duration: u64,

    /// Location source
    #[arg(long, value_enum, default_value = "mock")]
    source: SourceKind,

    /// JSON config file (TrackerConfig)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write live status JSON here every tick
    #[arg(long)]
    status_path: Option<PathBuf>,

    /// Override the accuracy gate threshold (meters)
    #[arg(long)]
    max_accuracy: Option<f64>,

    /// Mock fix period in milliseconds
    #[arg(long, default_value = "1000")]
    mock_interval_ms: u64,

    /// Display units for the status line
    #[arg(long, value_enum, default_value = "metric")]
    units: UnitsArg,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TrackerConfig::from_file(path)?,
        None => TrackerConfig::default(),
    };
    if let Some(path) = &args.status_path {
        config.status_path = Some(path.clone());
    }
    if let Some(max_accuracy) = args.max_accuracy {
        config.max_accuracy_m = max_accuracy;
    }
    let units = match args.units {
        UnitsArg::Metric => DisplayUnits::Metric,
        UnitsArg::Imperial => DisplayUnits::Imperial,
    };

    println!("[{}] Track Meter Starting", ts_now());
    println!("  Duration: {} seconds (0=until stopped)", args.duration);
    println!("  Source: {:?}", args.source);
    println!("  Accuracy gate: {:.1} m", config.max_accuracy_m);
    println!("  Smoothing: alpha={} window={}", config.smoothing_alpha, config.smoothing_window);

    let events = match args.source {
        SourceKind::Mock => subscribe(MockLocationSource::new(Duration::from_millis(
            args.mock_interval_ms.max(1),
        ))),
        SourceKind::Stdin => subscribe(JsonLinesSource::new(BufReader::new(tokio::io::stdin()))),
    };

    let handle = spawn_tracker(config.clone(), Some(events))?;

    let deadline = sleep(Duration::from_secs(args.duration));
    tokio::pin!(deadline);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut display = tokio::time::interval(Duration::from_millis(config.tick_interval_ms));
    let mut source_done = false;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                println!("[{}] Interrupted, stopping...", ts_now());
                break;
            }
            _ = &mut deadline, if args.duration > 0 => {
                println!("[{}] Duration reached, stopping...", ts_now());
                break;
            }
            _ = handle.source_ended(), if !source_done => {
                source_done = true;
                if args.duration == 0 {
                    println!("[{}] Input ended, stopping...", ts_now());
                    break;
                }
                println!("[{}] Input ended, clock keeps running until duration", ts_now());
            }
            _ = display.tick() => {
                println!("{}", status_line(&handle.latest(), units));
            }
        }
    }

    let final_snapshot = handle.stop().await?;

    println!("\n=== Final Stats ===");
    println!("{}", status_line(&final_snapshot, units));
    println!("Fixes accepted: {}", final_snapshot.counters.accepted);
    println!("Low accuracy fixes: {}", final_snapshot.counters.low_accuracy);
    println!("Sensing errors: {}", final_snapshot.counters.sensing_errors);
    println!("Distance: {:.2} m", final_snapshot.distance_m);

    Ok(())
}

fn status_line(snapshot: &SessionSnapshot, units: DisplayUnits) -> String {
    let speed = units.speed(snapshot.speed_mps);
    format!(
        "[{}] {:>6.1} {} ({:?}) | {:>7.2} {} | {} | {}",
        ts_now(),
        speed,
        units.speed_label(),
        SpeedBand::classify(speed),
        units.distance(snapshot.distance_m),
        units.distance_label(),
        format_elapsed(snapshot.elapsed_seconds),
        snapshot.status.label()
    )
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}
