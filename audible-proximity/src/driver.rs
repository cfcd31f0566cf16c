//! Playback driver that reports commands through the log
//!
//! Stands in for an audio engine: every command is logged at `info` and
//! accepted. Useful for installation checks and for piping the command
//! stream into another process via JSON logging.

use proximity_scheduler::{DriverError, PlaybackCommand, PlaybackDriver};
use tracing::info;

/// Target the driver logs under
pub const PLAYBACK_TARGET: &str = "proximity::playback";

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDriver {
    dispatched: u64,
}

impl TracingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }
}

impl PlaybackDriver for TracingDriver {
    fn dispatch(&mut self, command: &PlaybackCommand) -> Result<(), DriverError> {
        match command {
            PlaybackCommand::Play { slot, file_uri, volume } => {
                info!(target: PLAYBACK_TARGET, slot, volume, file = %file_uri, "play");
            }
            PlaybackCommand::SetVolume { slot, volume } => {
                info!(target: PLAYBACK_TARGET, slot, volume, "set volume");
            }
            PlaybackCommand::Stop { slot } => {
                info!(target: PLAYBACK_TARGET, slot, "stop");
            }
        }

        self.dispatched += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_every_command() {
        let mut driver = TracingDriver::new();
        assert!(driver.dispatch(&PlaybackCommand::Stop { slot: 0 }).is_ok());
        assert!(driver
            .dispatch(&PlaybackCommand::SetVolume { slot: 1, volume: 40 })
            .is_ok());
        assert_eq!(driver.dispatched(), 2);
    }
}
