//! Time utilities for the simulation and capture loops

use std::time::{Duration, Instant};

/// Tick rate configuration
pub const TARGET_TPS: u32 = 60; // 60 ticks per second

/// Delay between captured frames (the capture side paces itself, not the game)
pub const CAPTURE_INTERVAL_MS: u64 = 30;

/// Duration of a single tick at the given rate
pub fn tick_duration(ticks_per_second: u32) -> Duration {
    Duration::from_micros(1_000_000 / ticks_per_second.max(1) as u64)
}

/// A simple timer for measuring durations
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_micros(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    pub fn reset(&mut self) {
        self.start = Instant::now();
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_duration_matches_rate() {
        assert_eq!(tick_duration(60), Duration::from_micros(16_666));
        assert_eq!(tick_duration(1), Duration::from_secs(1));
    }

    #[test]
    fn zero_rate_does_not_divide_by_zero() {
        assert_eq!(tick_duration(0), Duration::from_secs(1));
    }

    #[test]
    fn timer_reset_restarts_measurement() {
        let mut timer = Timer::new();
        std::thread::sleep(Duration::from_millis(5));
        assert!(timer.elapsed() >= Duration::from_millis(5));
        timer.reset();
        assert!(timer.elapsed() < Duration::from_millis(5));
    }
}
