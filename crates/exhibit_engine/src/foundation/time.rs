//! Time management utilities
//!
//! Background loops (coasting, pose animation) pace themselves through a
//! [`Ticker`] so the same loop can run against the wall clock in an
//! application and without sleeping in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Paces a fixed-rate loop
pub trait Ticker: Send + Sync {
    /// Suspend the calling loop until its next tick
    fn wait(&self, interval: Duration);
}

/// Ticker backed by the wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameTicker;

impl Ticker for FrameTicker {
    fn wait(&self, interval: Duration) {
        std::thread::sleep(interval);
    }
}

/// Ticker that never sleeps and only counts requested ticks
#[derive(Debug, Default)]
pub struct ImmediateTicker {
    ticks: AtomicU64,
}

impl ImmediateTicker {
    /// Create a new immediate ticker
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ticks waited on so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Ticker for ImmediateTicker {
    fn wait(&self, _interval: Duration) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        std::thread::yield_now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_immediate_ticker_counts_without_sleeping() {
        let ticker = ImmediateTicker::new();
        let started = Instant::now();
        for _ in 0..100 {
            ticker.wait(Duration::from_secs(1));
        }
        assert_eq!(ticker.ticks(), 100);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_frame_ticker_sleeps_for_interval() {
        let started = Instant::now();
        FrameTicker.wait(Duration::from_millis(2));
        assert!(started.elapsed() >= Duration::from_millis(2));
    }
}
