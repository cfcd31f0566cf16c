//! Player pool slots

use serde::Serialize;

use super::DeviceId;

/// One unit of concurrent playback capacity
///
/// Holds the id of the device it plays, never the device itself; the
/// registry may drop that device, and the allocator then idles the slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSlot {
    index: usize,
    assigned_device_id: Option<DeviceId>,
    current_loudness: f64,
}

impl PlayerSlot {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            assigned_device_id: None,
            current_loudness: 0.0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn assigned_device_id(&self) -> Option<&DeviceId> {
        self.assigned_device_id.as_ref()
    }

    /// Last commanded loudness, unrounded
    pub fn current_loudness(&self) -> f64 {
        self.current_loudness
    }

    /// Last commanded loudness as the integer volume sent to the driver
    pub fn volume(&self) -> u8 {
        to_volume(self.current_loudness)
    }

    pub fn is_idle(&self) -> bool {
        self.assigned_device_id.is_none()
    }

    pub fn is_assigned_to(&self, device_id: &DeviceId) -> bool {
        self.assigned_device_id.as_ref() == Some(device_id)
    }

    pub(crate) fn assign(&mut self, device_id: DeviceId, loudness: f64) {
        self.assigned_device_id = Some(device_id);
        self.current_loudness = loudness;
    }

    pub(crate) fn set_loudness(&mut self, loudness: f64) {
        self.current_loudness = loudness;
    }

    pub(crate) fn idle(&mut self) {
        self.assigned_device_id = None;
        self.current_loudness = 0.0;
    }
}

/// Round a loudness value to a 0..=100 driver volume
pub fn to_volume(loudness: f64) -> u8 {
    loudness.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_slot_is_idle() {
        let slot = PlayerSlot::new(3);
        assert_eq!(slot.index(), 3);
        assert!(slot.is_idle());
        assert_eq!(slot.volume(), 0);
    }

    #[test]
    fn test_assign_and_idle() {
        let mut slot = PlayerSlot::new(0);
        let id = DeviceId::new("x");

        slot.assign(id.clone(), 62.6);
        assert!(slot.is_assigned_to(&id));
        assert_eq!(slot.volume(), 63);

        slot.idle();
        assert!(slot.is_idle());
        assert_eq!(slot.current_loudness(), 0.0);
    }

    #[test]
    fn test_to_volume_clamps() {
        assert_eq!(to_volume(-3.0), 0);
        assert_eq!(to_volume(100.4), 100);
        assert_eq!(to_volume(250.0), 100);
        assert_eq!(to_volume(49.5), 50);
    }
}
