//! Time sources for the annealing schedule

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Monotonic elapsed-seconds source
pub trait Clock {
    /// Seconds since the clock was created
    fn elapsed_secs(&self) -> f64;
}

/// Real monotonic time
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    /// Clock starting now
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    #[inline]
    fn elapsed_secs(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven clock for tests and deterministic runs
///
/// Clones share the same time, so a test can keep a handle while the
/// solver owns another. With a non-zero `step`, every read advances the
/// clock by `step` seconds after returning the current value.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
    step: f64,
}

impl ManualClock {
    /// Clock frozen at zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock that advances by `step` seconds per read
    #[must_use]
    pub fn ticking(step: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(0f64.to_bits())),
            step,
        }
    }

    /// Jump to `secs`
    pub fn set(&self, secs: f64) {
        self.bits.store(secs.to_bits(), Ordering::Relaxed);
    }

    /// Move forward by `secs`
    pub fn advance(&self, secs: f64) {
        self.set(self.now() + secs);
    }

    /// Current reading without ticking
    #[must_use]
    pub fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl Clock for ManualClock {
    fn elapsed_secs(&self) -> f64 {
        let now = self.now();
        if self.step != 0.0 {
            self.set(now + self.step);
        }
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance(2.5);
        assert!((clock.elapsed_secs() - 2.5).abs() < f64::EPSILON);
        assert!((clock.elapsed_secs() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn ticking_clock_advances_per_read() {
        let clock = ManualClock::ticking(0.5);
        assert!(clock.elapsed_secs().abs() < f64::EPSILON);
        assert!((clock.elapsed_secs() - 0.5).abs() < f64::EPSILON);
        assert!((clock.now() - 1.0).abs() < f64::EPSILON);
    }
}
