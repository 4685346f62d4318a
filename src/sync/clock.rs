use std::time::Instant;

use bevy::prelude::Resource;

/// Maps wall-clock milliseconds to an estimated playback position.
///
/// Holds `ground_zero = now - position` from the last reconciliation. The
/// authoritative source updates too coarsely for per-frame animation, so
/// between reconciliations the position is simply `now - ground_zero`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClockEstimator {
    ground_zero: f64,
}

impl ClockEstimator {
    pub fn ground_zero(&self) -> f64 {
        self.ground_zero
    }

    pub fn estimate(&self, now: f64) -> f64 {
        now - self.ground_zero
    }

    /// Unconditionally anchors the estimate so that `estimate(now) == position`.
    pub fn rebase(&mut self, now: f64, position: f64) {
        self.ground_zero = now - position;
    }

    /// Snaps to the authoritative position only when the drift exceeds
    /// `tolerance`. Returns whether a snap happened.
    pub fn resync(&mut self, now: f64, authoritative: f64, tolerance: f64) -> bool {
        let target = now - authoritative;
        if (self.ground_zero - target).abs() > tolerance {
            self.ground_zero = target;
            true
        } else {
            false
        }
    }
}

/// Monotonic wall clock in milliseconds since the stage was created.
#[derive(Resource, Debug, Clone, Copy)]
pub struct WallClock {
    origin: Instant,
}

impl Default for WallClock {
    fn default() -> Self {
        Self { origin: Instant::now() }
    }
}

impl WallClock {
    pub fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebase_then_estimate_tracks_wall_clock() {
        let mut clock = ClockEstimator::default();
        clock.rebase(10_000.0, 2_500.0);
        assert_eq!(clock.ground_zero(), 7_500.0);
        assert_eq!(clock.estimate(10_000.0), 2_500.0);
        assert_eq!(clock.estimate(10_016.0), 2_516.0);
    }

    #[test]
    fn test_resync_ignores_small_drift_in_both_directions() {
        let mut clock = ClockEstimator::default();
        clock.rebase(10_000.0, 2_000.0);
        assert!(!clock.resync(11_000.0, 3_080.0, 100.0));
        assert!(!clock.resync(11_000.0, 2_920.0, 100.0));
        assert!(!clock.resync(11_000.0, 3_100.0, 100.0));
        assert_eq!(clock.estimate(11_000.0), 3_000.0);
    }

    #[test]
    fn test_resync_snaps_on_large_drift_in_both_directions() {
        let mut clock = ClockEstimator::default();
        clock.rebase(10_000.0, 2_000.0);
        assert!(clock.resync(11_000.0, 3_150.0, 100.0));
        assert_eq!(clock.estimate(11_000.0), 3_150.0);

        assert!(clock.resync(12_000.0, 3_900.0, 100.0));
        assert_eq!(clock.estimate(12_000.0), 3_900.0);
    }

    #[test]
    fn test_estimate_stays_within_tolerance_after_any_resync() {
        let mut clock = ClockEstimator::default();
        clock.rebase(0.0, 0.0);
        let samples = [(500.0, 430.0), (1_000.0, 1_250.0), (1_500.0, 1_760.0), (2_000.0, 1_800.0)];
        for (now, authoritative) in samples {
            clock.resync(now, authoritative, 100.0);
            assert!((clock.estimate(now) - authoritative).abs() <= 100.0);
        }
    }

    #[test]
    fn test_wall_clock_is_monotonic() {
        let clock = WallClock::default();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
