/// Elapsed tracking time as a count of one-second ticks.
///
/// The tick count is authoritative; no wall-clock alignment is attempted.
#[derive(Clone, Debug, Default)]
pub struct SessionClock {
    elapsed_seconds: u64,
    running: bool,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance by one second. No effect while stopped.
    pub fn tick(&mut self) {
        if self.running {
            self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
        }
    }

    pub fn reset(&mut self) {
        self.elapsed_seconds = 0;
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sixty_ticks() {
        let mut clock = SessionClock::new();
        clock.start();
        for _ in 0..60 {
            clock.tick();
        }
        assert_eq!(clock.elapsed_seconds(), 60);
    }

    #[test]
    fn test_tick_ignored_when_stopped() {
        let mut clock = SessionClock::new();
        clock.tick();
        assert_eq!(clock.elapsed_seconds(), 0);

        clock.start();
        clock.tick();
        clock.stop();
        clock.tick();
        clock.tick();
        assert_eq!(clock.elapsed_seconds(), 1);
        assert!(!clock.is_running());
    }

    #[test]
    fn test_reset() {
        let mut clock = SessionClock::new();
        clock.start();
        for _ in 0..125 {
            clock.tick();
        }
        clock.reset();
        assert_eq!(clock.elapsed_seconds(), 0);

        // Reset on an already-zero clock is a no-op
        clock.reset();
        assert_eq!(clock.elapsed_seconds(), 0);
    }
}
