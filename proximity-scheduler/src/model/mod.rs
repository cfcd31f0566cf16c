//! Model types for the proximity scheduler

mod audible_device;
mod device_id;
mod observation;
mod player_slot;

pub use audible_device::AudibleDevice;
pub use device_id::DeviceId;
pub use observation::Observation;
pub use player_slot::{to_volume, PlayerSlot};
