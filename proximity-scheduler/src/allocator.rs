//! Player allocator
//!
//! Runs once per tick, after decay. Given the registry's ranking it decides
//! which devices hold the fixed pool of player slots and emits the commands
//! that move the slots from their previous state to the new one.
//!
//! ```text
//! ranked devices ──► top N (non-silent)
//!                        │
//!   1. continuity   slots already holding a top-N device keep it,
//!                   volume smoothed towards the device's target;
//!                   a slot whose smoothed volume rounds to 0 is stopped
//!   2. reassignment remaining top-N devices, loudest first,
//!                   fill the remaining slots, lowest index first
//!   3. idle         slots still unfilled are stopped
//!                        │
//!                   diff(before, after) ──► Play / SetVolume / Stop
//! ```

use crate::command::PlaybackCommand;
use crate::loudness::{is_silent, Smoothing};
use crate::model::{AudibleDevice, PlayerSlot};

/// The fixed pool of player slots and the rules for filling it
#[derive(Debug, Clone)]
pub struct PlayerAllocator {
    slots: Vec<PlayerSlot>,
    smoothing: Smoothing,
}

impl PlayerAllocator {
    /// Create `pool_size` idle slots
    pub fn new(pool_size: usize, smoothing: Smoothing) -> Self {
        Self {
            slots: (0..pool_size).map(PlayerSlot::new).collect(),
            smoothing,
        }
    }

    pub fn slots(&self) -> &[PlayerSlot] {
        &self.slots
    }

    pub fn pool_size(&self) -> usize {
        self.slots.len()
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_idle()).count()
    }

    /// Reassign slots for this tick's ranking
    ///
    /// `ranked` must be ordered loudest first. Returns only the commands for
    /// slots whose state changed.
    pub fn allocate(&mut self, ranked: &[&AudibleDevice]) -> Vec<PlaybackCommand> {
        let pool_size = self.slots.len();
        let top: Vec<&AudibleDevice> = ranked
            .iter()
            .copied()
            .filter(|device| !is_silent(device.target_loudness()))
            .take(pool_size)
            .collect();

        let before = self.slots.clone();
        let mut resolved = vec![false; pool_size];
        let mut placed = vec![false; top.len()];

        // Continuity: keep devices that are still wanted on the slot they have
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(assigned) = slot.assigned_device_id() else {
                continue;
            };
            let Some(rank) = top.iter().position(|device| device.id() == assigned) else {
                continue;
            };
            if placed[rank] {
                continue;
            }

            let smoothed = self
                .smoothing
                .apply(slot.current_loudness(), top[rank].target_loudness());
            placed[rank] = true;

            // Never leave a slot playing at volume 0; it is idled below
            if is_silent(smoothed) {
                continue;
            }

            slot.set_loudness(smoothed);
            resolved[index] = true;
        }

        // Reassignment: loudest unplaced device takes the lowest free slot
        let free: Vec<usize> = (0..pool_size).filter(|&index| !resolved[index]).collect();
        let unplaced = top
            .iter()
            .enumerate()
            .filter(|(rank, _)| !placed[*rank])
            .map(|(_, device)| device);

        for (index, device) in free.into_iter().zip(unplaced) {
            self.slots[index].assign(device.id().clone(), device.target_loudness());
            resolved[index] = true;
        }

        // Idle whatever is left
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !resolved[index] {
                slot.idle();
            }
        }

        before
            .iter()
            .zip(self.slots.iter())
            .filter_map(|(previous, current)| transition(previous, current, &top))
            .collect()
    }

    /// Stop every occupied slot and leave the whole pool idle
    pub fn release_all(&mut self) -> Vec<PlaybackCommand> {
        self.slots
            .iter_mut()
            .filter(|slot| !slot.is_idle())
            .map(|slot| {
                slot.idle();
                PlaybackCommand::Stop { slot: slot.index() }
            })
            .collect()
    }

    /// Forget what a slot plays without commanding anything
    ///
    /// Used when the driver rejected a `Play`: the slot looks free on the
    /// next tick, so the device is offered a slot (and a fresh `Play`) again
    /// if it is still ranked.
    pub fn forget(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.idle();
        }
    }
}

/// Command taking a slot from `previous` to `current`, if anything changed
fn transition(
    previous: &PlayerSlot,
    current: &PlayerSlot,
    top: &[&AudibleDevice],
) -> Option<PlaybackCommand> {
    let slot = current.index();

    match (previous.assigned_device_id(), current.assigned_device_id()) {
        (None, None) => None,
        (Some(_), None) => Some(PlaybackCommand::Stop { slot }),
        (before, Some(now)) if before == Some(now) => {
            (previous.volume() != current.volume()).then(|| PlaybackCommand::SetVolume {
                slot,
                volume: current.volume(),
            })
        }
        (_, Some(now)) => top
            .iter()
            .find(|device| device.id() == now)
            .map(|device| PlaybackCommand::Play {
                slot,
                file_uri: device.file_uri().clone(),
                volume: current.volume(),
            }),
    }
}
