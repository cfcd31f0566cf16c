//! Loudness model
//!
//! RSSI is noisy and non-linear with distance. Instead of a propagation
//! model, a clamped linear map between two deployer-tuned thresholds gives a
//! bounded, monotonic control signal in `[0, 100]`.

use crate::error::ConfigError;
use crate::model::to_volume;

/// Loudness of a device at or above `max_rssi`
pub const MAX_LOUDNESS: f64 = 100.0;


/// Map a signal strength (dBm) onto `[0, 100]`
///
/// Returns 100 at or above `max_rssi`, 0 at or below `min_rssi`, and a
/// linear interpolation in between. Callers guarantee `max_rssi > min_rssi`
/// (enforced by config validation).
pub fn loudness(signal_strength: i32, max_rssi: i32, min_rssi: i32) -> f64 {
    if signal_strength >= max_rssi {
        return MAX_LOUDNESS;
    }
    if signal_strength <= min_rssi {
        return 0.0;
    }

    let span = f64::from(max_rssi) - f64::from(min_rssi);
    MAX_LOUDNESS * (f64::from(signal_strength) - f64::from(min_rssi)) / span
}

/// Whether a loudness value counts as silence
///
/// Silent means the driver volume would round to 0, so a silent device is
/// stopped rather than played at volume 0.
pub fn is_silent(loudness: f64) -> bool {
    to_volume(loudness) == 0
}

/// Loudness thresholds for one deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoudnessModel {
    max_rssi: i32,
    min_rssi: i32,
}

impl LoudnessModel {
    pub fn new(max_rssi: i32, min_rssi: i32) -> Self {
        Self { max_rssi, min_rssi }
    }

    pub fn max_rssi(&self) -> i32 {
        self.max_rssi
    }

    pub fn min_rssi(&self) -> i32 {
        self.min_rssi
    }

    pub fn loudness(&self, signal_strength: i32) -> f64 {
        loudness(signal_strength, self.max_rssi, self.min_rssi)
    }
}

impl Default for LoudnessModel {
    fn default() -> Self {
        Self::new(-60, -80)
    }
}

/// Exponential smoothing filter with a fixed weight
///
/// `apply(previous, next) = previous + weight * (next - previous)`. The
/// default weight of 0.5 averages the new value with the previous one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothing(f64);

impl Smoothing {
    pub const DEFAULT_WEIGHT: f64 = 0.5;

    /// Create a filter; the weight must lie in `(0, 1]`
    pub fn new(weight: f64) -> Result<Self, ConfigError> {
        if weight > 0.0 && weight <= 1.0 {
            Ok(Self(weight))
        } else {
            Err(ConfigError::InvalidSmoothing(weight))
        }
    }

    pub fn weight(&self) -> f64 {
        self.0
    }

    pub fn apply(&self, previous: f64, next: f64) -> f64 {
        previous + self.0 * (next - previous)
    }
}

impl Default for Smoothing {
    fn default() -> Self {
        Self(Self::DEFAULT_WEIGHT)
    }
}
