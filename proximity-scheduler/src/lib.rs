//! Proximity Scheduler
//!
//! Plays audio on a device with a small, fixed number of players, choosing
//! what to play and how loud from the signal strength of nearby beacons.
//!
//! # Architecture
//!
//! ```text
//! Observation ──► DeviceRegistry ◄── tick: decay ──► PlayerAllocator ──► PlaybackDriver
//!  (any time)     (smoothed loudness)                (fixed slot pool)    (Play/SetVolume/Stop)
//! ```
//!
//! - **Loudness model**: clamped linear map from RSSI to `[0, 100]`
//! - **Device registry**: devices whose payload names a playable file,
//!   smoothed on every observation
//! - **Staleness decay**: linear fade over silence, forced to zero at the
//!   stale threshold, entries dropped once silent and stale
//! - **Player allocator**: loudest devices get slots, devices keep the slot
//!   they already have, freed slots go to the next loudest
//!
//! # Quick Start
//!
//! ```rust
//! use proximity_decoder::Mp3FileResolver;
//! use proximity_scheduler::{Observation, ProximityScheduler, RecordingDriver, SchedulerConfig};
//!
//! let config = SchedulerConfig::default();
//! config.validate().expect("default config is valid");
//!
//! let resolver = Mp3FileResolver::new(&config.audio_root);
//! let mut scheduler = ProximityScheduler::new(&config, resolver, RecordingDriver::new()).unwrap();
//!
//! scheduler.observe(&Observation::new("beacon-1", -65, 0, b"welcome.mp3".to_vec()));
//! for command in scheduler.tick(0) {
//!     println!("{}", command);
//! }
//! ```

// Core modules
pub mod allocator;
pub mod decay;
pub mod loudness;
pub mod model;
pub mod registry;

// Driver boundary
pub mod command;
pub mod driver;

// Tick engine
pub mod scheduler;
pub mod snapshot;

// Configuration and errors
pub mod config;
pub mod error;

// ============================================================================
// Re-exports
// ============================================================================

pub use allocator::PlayerAllocator;
pub use command::PlaybackCommand;
pub use config::SchedulerConfig;
pub use decay::StalenessPolicy;
pub use driver::{ChannelDriver, PlaybackDriver, RecordingDriver};
pub use error::{ConfigError, DriverError};
pub use loudness::{loudness, LoudnessModel, Smoothing};
pub use model::{AudibleDevice, DeviceId, Observation, PlayerSlot};
pub use registry::{DeviceRegistry, ObserveOutcome};
pub use scheduler::ProximityScheduler;
pub use snapshot::TickSnapshot;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::command::PlaybackCommand;
    pub use crate::config::SchedulerConfig;
    pub use crate::driver::{ChannelDriver, PlaybackDriver, RecordingDriver};
    pub use crate::model::{DeviceId, Observation};
    pub use crate::scheduler::ProximityScheduler;
    pub use proximity_decoder::{FileUri, Mp3FileResolver, PayloadResolver};
}
