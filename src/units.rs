//! Display-side conversions for the dashboard readouts.
//!
//! The session only reports SI values (m/s, meters, seconds); everything here
//! is for whoever renders them.

use serde::{Deserialize, Serialize};

const MPS_TO_KPH: f64 = 3.6;
const MPS_TO_MPH: f64 = 2.23694;
const METERS_TO_MILES: f64 = 0.000621371;

/// Gauge full-scale values in display units
pub const SPEED_GAUGE_FULL_SCALE: f64 = 50.0;
pub const DISTANCE_GAUGE_FULL_SCALE: f64 = 100.0;
pub const ELAPSED_GAUGE_FULL_SCALE_SECS: f64 = 3600.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayUnits {
    #[default]
    Metric,
    Imperial,
}

impl DisplayUnits {
    pub fn toggle(self) -> Self {
        match self {
            DisplayUnits::Metric => DisplayUnits::Imperial,
            DisplayUnits::Imperial => DisplayUnits::Metric,
        }
    }

    /// km/h or mph
    pub fn speed(self, mps: f64) -> f64 {
        match self {
            DisplayUnits::Metric => mps * MPS_TO_KPH,
            DisplayUnits::Imperial => mps * MPS_TO_MPH,
        }
    }

    /// km or mi
    pub fn distance(self, meters: f64) -> f64 {
        match self {
            DisplayUnits::Metric => meters / 1000.0,
            DisplayUnits::Imperial => meters * METERS_TO_MILES,
        }
    }

    pub fn speed_label(self) -> &'static str {
        match self {
            DisplayUnits::Metric => "km/h",
            DisplayUnits::Imperial => "mph",
        }
    }

    pub fn distance_label(self) -> &'static str {
        match self {
            DisplayUnits::Metric => "km",
            DisplayUnits::Imperial => "mi",
        }
    }
}

/// Color band for the speed gauge, by speed in display units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedBand {
    Green,
    Yellow,
    Red,
}

impl SpeedBand {
    pub fn classify(display_speed: f64) -> Self {
        if display_speed < 20.0 {
            SpeedBand::Green
        } else if display_speed < 35.0 {
            SpeedBand::Yellow
        } else {
            SpeedBand::Red
        }
    }
}

/// "mm:ss"; minutes keep growing past 99 rather than wrapping
pub fn format_elapsed(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Arc fill fraction in [0, 1]
pub fn gauge_fraction(value: f64, full_scale: f64) -> f64 {
    if full_scale <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / full_scale).clamp(0.0, 1.0)
}
