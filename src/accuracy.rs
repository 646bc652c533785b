/// Default accuracy radius above which a fix is discarded (meters)
pub const DEFAULT_MAX_ACCURACY_M: f64 = 20.0;

/// Hard accuracy threshold for incoming fixes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AccuracyGate {
    max_accuracy_m: f64,
}

impl AccuracyGate {
    pub fn new(max_accuracy_m: f64) -> Self {
        Self { max_accuracy_m }
    }

    /// True when the fix is usable. The threshold itself is accepted.
    /// NaN accuracy is rejected.
    pub fn accept(&self, accuracy_m: f64) -> bool {
        accuracy_m <= self.max_accuracy_m
    }

    pub fn max_accuracy_m(&self) -> f64 {
        self.max_accuracy_m
    }
}

impl Default for AccuracyGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ACCURACY_M)
    }
}
