//! Error types for the proximity scheduler
//!
//! Only the edges can fail: configuration is checked once at start-up and
//! the playback driver may reject commands. Observation handling and ticks
//! have no failure path.

use thiserror::Error;

/// Invalid configuration; fatal at start-up
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Pool size must be at least 1, got {0}")]
    InvalidPoolSize(usize),

    #[error("RSSI thresholds inverted: max_rssi ({max_rssi}) must be greater than min_rssi ({min_rssi})")]
    InvertedRssiThresholds { max_rssi: i32, min_rssi: i32 },

    #[error("Tick interval must be greater than 0")]
    InvalidTickInterval,

    #[error("Stale threshold must be greater than 0")]
    InvalidStaleThreshold,

    #[error("Smoothing weight must be in (0, 1], got {0}")]
    InvalidSmoothing(f64),
}

/// A command rejected by the playback driver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// The driver refused the command (missing file, decoder failure, ...)
    #[error("Slot {slot} rejected command: {reason}")]
    Rejected { slot: usize, reason: String },

    /// The driver side of the command channel has gone away
    #[error("Playback driver disconnected")]
    Disconnected,
}

/// Result type for configuration checks
pub type Result<T> = std::result::Result<T, ConfigError>;
