//! Device identity type

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an observed beacon
///
/// Opaque to the scheduler. When built from a radio decoding it is the
/// transmitter signature, `"<transmitter id>/<id type>"`, so the same
/// address reported under two address types stays two devices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a new DeviceId, trimming surrounding whitespace
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self(id.trim().to_string())
    }

    /// Creates a DeviceId from a transmitter id and its id type
    pub fn from_signature(transmitter_id: &str, id_type: impl fmt::Display) -> Self {
        Self::new(format!("{}/{}", transmitter_id.trim().to_ascii_lowercase(), id_type))
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        DeviceId::new(s)
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        DeviceId::new(s)
    }
}
