use std::collections::VecDeque;

/// Default blend weight for new speed readings
pub const DEFAULT_ALPHA: f64 = 0.3;
/// Default number of smoothed values kept for the moving average
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Exponential smoothing followed by a bounded moving average for GPS speed.
///
/// Each raw reading is blended with the previous smoothed value, the result is
/// pushed into a FIFO window, and the estimate is the mean of that window.
/// The double damping trades responsiveness for stability against
/// speed-field jitter and single-fix dropouts.
pub struct SpeedSmoother {
    window: VecDeque<f64>,
    window_size: usize,
    alpha: f64,
}

impl SpeedSmoother {
    /// Create a new smoother with the given blend factor and window size (typically 0.3 / 10)
    pub fn new(alpha: f64, window_size: usize) -> Self {
        let window_size = window_size.max(1);
        SpeedSmoother {
            window: VecDeque::with_capacity(window_size),
            window_size,
            alpha,
        }
    }

    /// Feed a raw speed reading (m/s) and return the new estimate.
    /// Missing, negative or non-finite readings count as standing still.
    pub fn update(&mut self, raw_speed: Option<f64>) -> f64 {
        let speed = sanitize_speed(raw_speed);

        let smoothed = match self.window.back() {
            Some(&prev) => self.alpha * speed + (1.0 - self.alpha) * prev,
            None => speed,
        };

        self.window.push_back(smoothed);
        while self.window.len() > self.window_size {
            self.window.pop_front();
        }

        self.current_estimate()
    }

    /// Mean of the smoothed history, 0 when empty
    pub fn current_estimate(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    /// Most recent single-step smoothed value
    pub fn last_smoothed(&self) -> Option<f64> {
        self.window.back().copied()
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }

    /// Get current window size (actual, not max)
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Check if window is empty
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }
}

impl Default for SpeedSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA, DEFAULT_WINDOW_SIZE)
    }
}

fn sanitize_speed(raw: Option<f64>) -> f64 {
    match raw {
        Some(s) if s.is_finite() && s > 0.0 => s,
        _ => 0.0,
    }
}
