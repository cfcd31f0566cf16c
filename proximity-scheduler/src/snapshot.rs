//! Human-readable view of the scheduler state
//!
//! Advisory only; nothing reads it back.

use std::fmt;

use proximity_decoder::FileUri;
use serde::Serialize;

use crate::decay::silence_ms;
use crate::model::{AudibleDevice, DeviceId, PlayerSlot};

/// Ranking and slot table at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSnapshot {
    pub at: u64,
    pub ranking: Vec<RankedDevice>,
    pub slots: Vec<SlotView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDevice {
    pub id: DeviceId,
    pub loudness: f64,
    pub silence_ms: u64,
    pub file_uri: FileUri,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotView {
    pub index: usize,
    pub device: Option<DeviceId>,
    pub volume: u8,
}

impl TickSnapshot {
    pub fn capture(at: u64, ranked: &[&AudibleDevice], slots: &[PlayerSlot]) -> Self {
        Self {
            at,
            ranking: ranked
                .iter()
                .map(|device| RankedDevice {
                    id: device.id().clone(),
                    loudness: device.target_loudness(),
                    silence_ms: silence_ms(device.last_seen(), at),
                    file_uri: device.file_uri().clone(),
                })
                .collect(),
            slots: slots
                .iter()
                .map(|slot| SlotView {
                    index: slot.index(),
                    device: slot.assigned_device_id().cloned(),
                    volume: slot.volume(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for TickSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "tick @ {}", self.at)?;

        for slot in &self.slots {
            match &slot.device {
                Some(id) => writeln!(f, "  slot {}: {} vol {}", slot.index, id, slot.volume)?,
                None => writeln!(f, "  slot {}: idle", slot.index)?,
            }
        }

        for (rank, device) in self.ranking.iter().enumerate() {
            writeln!(
                f,
                "  #{} {} loudness {:.1} silent {}ms {}",
                rank + 1,
                device.id,
                device.loudness,
                device.silence_ms,
                device.file_uri.file_name()
            )?;
        }

        Ok(())
    }
}
