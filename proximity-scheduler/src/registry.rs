//! Device registry
//!
//! Owns every [`AudibleDevice`]. Updated on each observation and decayed on
//! each tick. No I/O happens here.

use std::cmp::Ordering;
use std::collections::HashMap;

use proximity_decoder::PayloadResolver;

use crate::decay::StalenessPolicy;
use crate::loudness::{LoudnessModel, Smoothing};
use crate::model::{AudibleDevice, DeviceId, Observation};

/// What an observation did to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserveOutcome {
    /// First playable observation of a device
    Created,
    /// Known device, loudness smoothed
    Updated,
    /// Unknown device whose payload names nothing playable
    Discarded,
}

/// The set of audible devices and their target loudness
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    devices: HashMap<DeviceId, AudibleDevice>,
    loudness: LoudnessModel,
    smoothing: Smoothing,
    next_sequence: u64,
}

impl DeviceRegistry {
    pub fn new(loudness: LoudnessModel, smoothing: Smoothing) -> Self {
        Self {
            devices: HashMap::new(),
            loudness,
            smoothing,
            next_sequence: 0,
        }
    }

    /// Apply one observation
    ///
    /// Known devices are smoothed towards the new loudness. Unknown devices
    /// are only created when `resolver` finds a playable file in the payload;
    /// the resolver is never consulted for known devices.
    pub fn observe<R>(&mut self, observation: &Observation, resolver: &R) -> ObserveOutcome
    where
        R: PayloadResolver + ?Sized,
    {
        let computed = self.loudness.loudness(observation.signal_strength);

        if let Some(device) = self.devices.get_mut(&observation.device_id) {
            device.record_observation(computed, observation.timestamp, self.smoothing);
            tracing::trace!(
                "Updated {} to loudness {:.1} (rssi {})",
                observation.device_id,
                device.target_loudness(),
                observation.signal_strength
            );
            return ObserveOutcome::Updated;
        }

        let Some(file_uri) = resolver.resolve(&observation.raw_payload) else {
            return ObserveOutcome::Discarded;
        };

        tracing::debug!(
            "Tracking new device {} -> {} at loudness {:.1}",
            observation.device_id,
            file_uri,
            computed
        );

        let device = AudibleDevice::new(
            observation.device_id.clone(),
            file_uri,
            computed,
            observation.timestamp,
            self.next_sequence,
        );
        self.next_sequence += 1;
        self.devices.insert(observation.device_id.clone(), device);

        ObserveOutcome::Created
    }

    /// Fade every device according to its silence at `now`
    pub fn tick_decay(&mut self, now: u64, policy: &StalenessPolicy) {
        for device in self.devices.values_mut() {
            device.apply_decay(now, policy);
        }
    }

    /// Drop devices that are both silent and stale, returning their ids
    ///
    /// Call after allocation so any slot they held has already been stopped.
    pub fn remove_expired(&mut self, now: u64, policy: &StalenessPolicy) -> Vec<DeviceId> {
        let mut expired: Vec<DeviceId> = self
            .devices
            .values()
            .filter(|device| device.is_expired(now, policy))
            .map(|device| device.id().clone())
            .collect();
        expired.sort();

        for id in &expired {
            self.devices.remove(id);
            tracing::debug!("Removed stale device {}", id);
        }

        expired
    }

    /// Devices ordered loudest first; equal loudness keeps insertion order
    pub fn ranked(&self) -> Vec<&AudibleDevice> {
        let mut ranked: Vec<&AudibleDevice> = self.devices.values().collect();
        ranked.sort_by(|a, b| compare_rank(a, b));
        ranked
    }

    pub fn get(&self, id: &DeviceId) -> Option<&AudibleDevice> {
        self.devices.get(id)
    }

    pub fn contains(&self, id: &DeviceId) -> bool {
        self.devices.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn loudness_model(&self) -> &LoudnessModel {
        &self.loudness
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new(LoudnessModel::default(), Smoothing::default())
    }
}

fn compare_rank(a: &AudibleDevice, b: &AudibleDevice) -> Ordering {
    b.target_loudness()
        .total_cmp(&a.target_loudness())
        .then_with(|| a.sequence().cmp(&b.sequence()))
}
