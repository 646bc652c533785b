use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde_json::json;
use track_meter_rs::replay::{load_log, replay};
use track_meter_rs::TrackerConfig;

#[derive(Parser, Debug)]
struct Args {
    /// Path to a {"fixes": [...]} log (.json or .json.gz)
    #[arg(long, conflicts_with = "log_dir")]
    log: Option<PathBuf>,

    /// Directory of logs to batch replay (processes *.json and *.json.gz)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// JSON config file (TrackerConfig)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Accuracy gate threshold (meters)
    #[arg(long)]
    max_accuracy: Option<f64>,

    /// Noise floor (meters)
    #[arg(long)]
    noise_floor: Option<f64>,

    /// Smoothing factor
    #[arg(long)]
    alpha: Option<f64>,

    /// Smoothing window length
    #[arg(long)]
    window: Option<usize>,
}

fn run_once(path: &Path, config: &TrackerConfig) -> anyhow::Result<serde_json::Value> {
    let log = load_log(path)?;
    let summary = replay(config, &log.fixes);
    log::info!(
        "{}: {} fixes, {:.1} m in {} s",
        path.display(),
        summary.total_fixes,
        summary.distance_m,
        summary.elapsed_seconds
    );

    Ok(json!({
        "log": path.display().to_string(),
        "summary": summary,
    }))
}

fn collect_logs(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut logs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            let name = p.file_name().and_then(|n| n.to_str()).unwrap_or("");
            name.ends_with(".json") || name.ends_with(".json.gz")
        })
        .collect();
    logs.sort();
    Ok(logs)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TrackerConfig::from_file(path)?,
        None => TrackerConfig::default(),
    };
    if let Some(v) = args.max_accuracy {
        config.max_accuracy_m = v;
    }
    if let Some(v) = args.noise_floor {
        config.noise_floor_m = v;
    }
    if let Some(v) = args.alpha {
        config.smoothing_alpha = v;
    }
    if let Some(v) = args.window {
        config.smoothing_window = v;
    }
    config.validate()?;

    let logs = match (&args.log, &args.log_dir) {
        (Some(path), _) => vec![path.clone()],
        (None, Some(dir)) => collect_logs(dir)?,
        (None, None) => anyhow::bail!("pass --log or --log-dir"),
    };

    let mut results = Vec::with_capacity(logs.len());
    for path in &logs {
        match run_once(path, &config) {
            Ok(result) => results.push(result),
            Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
        }
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "config": config,
            "runs": results,
        }))?
    );

    Ok(())
}
