//! Proximity observation record

use super::DeviceId;

/// One received-signal report for a device, as handed over by the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Device the report is about
    pub device_id: DeviceId,
    /// Received signal strength in dBm
    pub signal_strength: i32,
    /// When the report was taken, milliseconds since the Unix epoch
    pub timestamp: u64,
    /// Advertised payload, resolved to a file only for unknown devices
    pub raw_payload: Vec<u8>,
}

impl Observation {
    pub fn new(
        device_id: impl Into<DeviceId>,
        signal_strength: i32,
        timestamp: u64,
        raw_payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            signal_strength,
            timestamp,
            raw_payload: raw_payload.into(),
        }
    }
}
