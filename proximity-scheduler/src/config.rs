//! Configuration for the proximity scheduler
//!
//! All options are static for the lifetime of a scheduler. Values are read
//! once at start-up (see the `audible-proximity` binary for file/env/flag
//! layering) and validated before anything runs.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::loudness::{LoudnessModel, Smoothing};
use crate::decay::StalenessPolicy;

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of concurrent players
    /// Default: 2
    pub pool_size: usize,

    /// Signal strength (dBm) at or above which a device plays at full loudness
    /// Default: -60
    pub max_rssi: i32,

    /// Signal strength (dBm) at or below which a device is inaudible
    /// Default: -80
    pub min_rssi: i32,

    /// Period of the decay + allocation tick
    /// Default: 500 ms
    pub tick_interval_ms: u64,

    /// Silence after which a device is forced to zero loudness
    /// Default: 10 seconds
    pub stale_threshold_ms: u64,

    /// Directory bare file names in payloads are resolved against
    /// Default: "./data/audio/"
    pub audio_root: PathBuf,

    /// Emit a ranking/slot snapshot every tick
    /// Default: false
    pub debug_logging: bool,

    /// Weight of the newest value in both smoothing filters
    /// Default: 0.5 (plain average with the previous value)
    pub smoothing: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pool_size: 2,
            max_rssi: -60,
            min_rssi: -80,
            tick_interval_ms: 500,
            stale_threshold_ms: 10_000,
            audio_root: PathBuf::from(proximity_decoder::DEFAULT_AUDIO_ROOT),
            debug_logging: false,
            smoothing: Smoothing::DEFAULT_WEIGHT,
        }
    }
}

impl SchedulerConfig {
    /// Create a new SchedulerConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset for a single player that reacts quickly, e.g. a headset walking tour
    pub fn single_player() -> Self {
        Self {
            pool_size: 1,
            tick_interval_ms: 250,
            stale_threshold_ms: 5_000,
            ..Default::default()
        }
    }

    /// Preset for busy rooms with many beacons and slow-moving listeners
    pub fn gallery() -> Self {
        Self {
            pool_size: 4,
            stale_threshold_ms: 20_000,
            smoothing: 0.25,
            ..Default::default()
        }
    }

    /// Validate the configuration
    ///
    /// The scheduler must refuse to start on error rather than run with
    /// undefined ranking behaviour.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(ConfigError::InvalidPoolSize(self.pool_size));
        }

        if self.max_rssi <= self.min_rssi {
            return Err(ConfigError::InvertedRssiThresholds {
                max_rssi: self.max_rssi,
                min_rssi: self.min_rssi,
            });
        }

        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidTickInterval);
        }

        if self.stale_threshold_ms == 0 {
            return Err(ConfigError::InvalidStaleThreshold);
        }

        Smoothing::new(self.smoothing)?;

        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn stale_threshold(&self) -> Duration {
        Duration::from_millis(self.stale_threshold_ms)
    }

    pub fn loudness_model(&self) -> LoudnessModel {
        LoudnessModel::new(self.max_rssi, self.min_rssi)
    }

    pub fn staleness_policy(&self) -> StalenessPolicy {
        StalenessPolicy::new(self.stale_threshold_ms)
    }

    /// Smoothing filter, falling back to the default weight if out of range
    pub fn smoothing_filter(&self) -> Smoothing {
        Smoothing::new(self.smoothing).unwrap_or_default()
    }

    /// Builder pattern methods for fluent configuration

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_rssi_range(mut self, max_rssi: i32, min_rssi: i32) -> Self {
        self.max_rssi = max_rssi;
        self.min_rssi = min_rssi;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = duration_ms(interval);
        self
    }

    pub fn with_stale_threshold(mut self, threshold: Duration) -> Self {
        self.stale_threshold_ms = duration_ms(threshold);
        self
    }

    pub fn with_audio_root(mut self, audio_root: impl Into<PathBuf>) -> Self {
        self.audio_root = audio_root.into();
        self
    }

    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    pub fn with_smoothing(mut self, weight: f64) -> Self {
        self.smoothing = weight;
        self
    }
}

/// Whole milliseconds, saturating at `u64::MAX`
fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.pool_size, 2);
        assert_eq!(config.max_rssi, -60);
        assert_eq!(config.min_rssi, -80);
        assert_eq!(config.tick_interval(), Duration::from_millis(500));
        assert_eq!(config.stale_threshold(), Duration::from_secs(10));
        assert_eq!(config.audio_root, PathBuf::from("./data/audio/"));
        assert!(!config.debug_logging);
        assert_eq!(config.smoothing, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let zero_pool = SchedulerConfig::new().with_pool_size(0);
        assert_eq!(zero_pool.validate(), Err(ConfigError::InvalidPoolSize(0)));

        let inverted = SchedulerConfig::new().with_rssi_range(-80, -60);
        assert!(matches!(
            inverted.validate(),
            Err(ConfigError::InvertedRssiThresholds { .. })
        ));

        let equal = SchedulerConfig::new().with_rssi_range(-70, -70);
        assert!(equal.validate().is_err());

        let no_tick = SchedulerConfig::new().with_tick_interval(Duration::ZERO);
        assert_eq!(no_tick.validate(), Err(ConfigError::InvalidTickInterval));

        let no_stale = SchedulerConfig::new().with_stale_threshold(Duration::ZERO);
        assert_eq!(no_stale.validate(), Err(ConfigError::InvalidStaleThreshold));

        let bad_smoothing = SchedulerConfig::new().with_smoothing(0.0);
        assert_eq!(bad_smoothing.validate(), Err(ConfigError::InvalidSmoothing(0.0)));
    }

    #[test]
    fn test_config_presets() {
        let single = SchedulerConfig::single_player();
        assert_eq!(single.pool_size, 1);
        assert!(single.validate().is_ok());

        let gallery = SchedulerConfig::gallery();
        assert_eq!(gallery.pool_size, 4);
        assert!(gallery.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = SchedulerConfig::new()
            .with_pool_size(3)
            .with_rssi_range(-55, -90)
            .with_tick_interval(Duration::from_millis(200))
            .with_stale_threshold(Duration::from_secs(4))
            .with_audio_root("/srv/audio")
            .with_debug_logging(true)
            .with_smoothing(0.3);

        assert_eq!(config.pool_size, 3);
        assert_eq!(config.loudness_model().max_rssi(), -55);
        assert_eq!(config.tick_interval_ms, 200);
        assert_eq!(config.stale_threshold_ms, 4_000);
        assert_eq!(config.audio_root, PathBuf::from("/srv/audio"));
        assert!(config.debug_logging);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_huge_durations_saturate() {
        let config = SchedulerConfig::new()
            .with_tick_interval(Duration::MAX)
            .with_stale_threshold(Duration::from_millis(u64::MAX) + Duration::from_secs(1));

        assert_eq!(config.tick_interval_ms, u64::MAX);
        assert_eq!(config.stale_threshold_ms, u64::MAX);
    }

    #[test]
    fn test_deserialize_partial_json_uses_defaults() {
        let config: SchedulerConfig =
            serde_json::from_str(r#"{ "pool_size": 3, "min_rssi": -90 }"#).unwrap();

        assert_eq!(config.pool_size, 3);
        assert_eq!(config.min_rssi, -90);
        assert_eq!(config.max_rssi, -60);
        assert_eq!(config.tick_interval_ms, 500);
    }
}
