//! Devices the registry is tracking

use proximity_decoder::FileUri;

use super::DeviceId;
use crate::decay::{silence_ms, StalenessPolicy};
use crate::loudness::Smoothing;

/// A device whose payload resolved to a playable file
///
/// Only the registry creates and mutates these. `file_uri` is fixed for the
/// lifetime of the entry.
#[derive(Debug, Clone, PartialEq)]
pub struct AudibleDevice {
    id: DeviceId,
    file_uri: FileUri,
    target_loudness: f64,
    /// Smoothed loudness as of the latest observation; decay starts from here
    observed_loudness: f64,
    last_seen: u64,
    /// Registry insertion sequence, the tie-break when ranking
    sequence: u64,
}

impl AudibleDevice {
    pub(crate) fn new(
        id: DeviceId,
        file_uri: FileUri,
        loudness: f64,
        timestamp: u64,
        sequence: u64,
    ) -> Self {
        Self {
            id,
            file_uri,
            target_loudness: loudness,
            observed_loudness: loudness,
            last_seen: timestamp,
            sequence,
        }
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    pub fn file_uri(&self) -> &FileUri {
        &self.file_uri
    }

    pub fn target_loudness(&self) -> f64 {
        self.target_loudness
    }

    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Fold a fresh loudness reading into the target
    pub(crate) fn record_observation(&mut self, loudness: f64, timestamp: u64, smoothing: Smoothing) {
        let smoothed = smoothing.apply(self.target_loudness, loudness);
        self.target_loudness = smoothed;
        self.observed_loudness = smoothed;
        self.last_seen = self.last_seen.max(timestamp);
    }

    /// Recompute the target from the last observation and the silence since
    pub(crate) fn apply_decay(&mut self, now: u64, policy: &StalenessPolicy) {
        let factor = policy.fade_factor(silence_ms(self.last_seen, now));
        self.target_loudness = self.observed_loudness * factor;
    }

    pub(crate) fn is_expired(&self, now: u64, policy: &StalenessPolicy) -> bool {
        policy.is_expired(self.target_loudness, silence_ms(self.last_seen, now))
    }
}
