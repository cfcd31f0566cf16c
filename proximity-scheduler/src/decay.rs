//! Staleness decay
//!
//! A device that stops being observed fades out linearly over twice the
//! stale threshold, and is cut to silence once the threshold itself is
//! reached. The fade is a pure function of elapsed silence, so evaluating it
//! twice at the same instant gives the same answer.

use crate::loudness::is_silent;

/// Timing rule for fading out and expiring silent devices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    threshold_ms: u64,
}

impl StalenessPolicy {
    pub fn new(threshold_ms: u64) -> Self {
        Self { threshold_ms }
    }

    pub fn threshold_ms(&self) -> u64 {
        self.threshold_ms
    }

    /// Multiplier in `[0, 1]` applied to a device's last observed loudness
    ///
    /// `1 - silence / (2 * threshold)` while `silence < threshold`, then 0.
    /// Continuous and non-increasing up to the threshold.
    pub fn fade_factor(&self, silence_ms: u64) -> f64 {
        if self.is_stale(silence_ms) {
            return 0.0;
        }

        let window = 2.0 * self.threshold_ms as f64;
        (1.0 - silence_ms as f64 / window).max(0.0)
    }

    /// Whether the device has been silent for at least the threshold
    pub fn is_stale(&self, silence_ms: u64) -> bool {
        silence_ms >= self.threshold_ms
    }

    /// Whether a device can be dropped from the registry
    pub fn is_expired(&self, loudness: f64, silence_ms: u64) -> bool {
        is_silent(loudness) && self.is_stale(silence_ms)
    }
}

/// Milliseconds between `last_seen` and `now`, zero if `now` is earlier
pub fn silence_ms(last_seen: u64, now: u64) -> u64 {
    now.saturating_sub(last_seen)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_starts_at_one() {
        let policy = StalenessPolicy::new(10_000);
        assert_eq!(policy.fade_factor(0), 1.0);
    }

    #[test]
    fn test_fade_is_linear_before_threshold() {
        let policy = StalenessPolicy::new(10_000);
        assert_eq!(policy.fade_factor(5_000), 0.75);
        assert!((policy.fade_factor(9_999) - 0.50005).abs() < 1e-9);
    }

    #[test]
    fn test_forced_to_zero_at_threshold() {
        let policy = StalenessPolicy::new(10_000);
        assert_eq!(policy.fade_factor(10_000), 0.0);
        assert_eq!(policy.fade_factor(60_000), 0.0);
    }

    #[test]
    fn test_fade_never_increases() {
        let policy = StalenessPolicy::new(1_000);
        let mut previous = policy.fade_factor(0);
        for silence in (0..3_000).step_by(7) {
            let factor = policy.fade_factor(silence);
            assert!(factor <= previous);
            previous = factor;
        }
    }

    #[test]
    fn test_expiry_needs_silence_and_staleness() {
        let policy = StalenessPolicy::new(10_000);
        assert!(policy.is_expired(0.0, 10_000));
        assert!(!policy.is_expired(0.0, 9_999));
        assert!(!policy.is_expired(12.0, 20_000));
    }

    #[test]
    fn test_silence_saturates() {
        assert_eq!(silence_ms(1_000, 1_500), 500);
        assert_eq!(silence_ms(2_000, 1_500), 0);
    }
}
