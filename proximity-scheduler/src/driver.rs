//! Playback driver boundary
//!
//! The audio engine lives behind [`PlaybackDriver`]. Dispatch must not block
//! the scheduler: a driver that does real work queues it and returns.

use std::collections::HashSet;
use std::sync::mpsc;

use crate::command::PlaybackCommand;
use crate::error::DriverError;

/// Receives slot commands from the scheduler
pub trait PlaybackDriver {
    /// Hand over one command; an error is reported but never retried
    fn dispatch(&mut self, command: &PlaybackCommand) -> Result<(), DriverError>;
}

impl<D: PlaybackDriver + ?Sized> PlaybackDriver for Box<D> {
    fn dispatch(&mut self, command: &PlaybackCommand) -> Result<(), DriverError> {
        (**self).dispatch(command)
    }
}

/// Fire-and-forget driver that forwards commands over a channel
///
/// The receiving end belongs to whatever actually plays audio, which owns
/// its own queuing and backpressure.
#[derive(Debug, Clone)]
pub struct ChannelDriver {
    tx: mpsc::Sender<PlaybackCommand>,
}

impl ChannelDriver {
    /// Create a driver and the receiver its commands arrive on
    pub fn new() -> (Self, mpsc::Receiver<PlaybackCommand>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl PlaybackDriver for ChannelDriver {
    fn dispatch(&mut self, command: &PlaybackCommand) -> Result<(), DriverError> {
        self.tx
            .send(command.clone())
            .map_err(|_| DriverError::Disconnected)
    }
}

/// In-memory driver that records everything it is sent
///
/// Useful for dry runs and tests. Can be told to reject `Play` commands for
/// particular file names to simulate missing files.
#[derive(Debug, Default, Clone)]
pub struct RecordingDriver {
    commands: Vec<PlaybackCommand>,
    missing_files: HashSet<String>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any `Play` whose file name is `file_name`
    pub fn with_missing_file(mut self, file_name: impl Into<String>) -> Self {
        self.missing_files.insert(file_name.into());
        self
    }

    /// Every accepted command, oldest first
    pub fn commands(&self) -> &[PlaybackCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the log empty
    pub fn drain(&mut self) -> Vec<PlaybackCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl PlaybackDriver for RecordingDriver {
    fn dispatch(&mut self, command: &PlaybackCommand) -> Result<(), DriverError> {
        if let PlaybackCommand::Play { slot, file_uri, .. } = command {
            if self.missing_files.contains(file_uri.file_name()) {
                return Err(DriverError::Rejected {
                    slot: *slot,
                    reason: format!("file not found: {}", file_uri),
                });
            }
        }

        self.commands.push(command.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proximity_decoder::FileUri;

    fn play(name: &str) -> PlaybackCommand {
        PlaybackCommand::Play {
            slot: 0,
            file_uri: FileUri::parse(&format!("file:///audio/{}", name)).unwrap(),
            volume: 50,
        }
    }

    #[test]
    fn test_channel_driver_forwards() {
        let (mut driver, rx) = ChannelDriver::new();
        driver.dispatch(&PlaybackCommand::Stop { slot: 1 }).unwrap();

        assert_eq!(rx.try_recv().unwrap(), PlaybackCommand::Stop { slot: 1 });
    }

    #[test]
    fn test_channel_driver_reports_disconnect() {
        let (mut driver, rx) = ChannelDriver::new();
        drop(rx);

        assert_eq!(
            driver.dispatch(&PlaybackCommand::Stop { slot: 0 }),
            Err(DriverError::Disconnected)
        );
    }

    #[test]
    fn test_recording_driver_rejects_missing_file() {
        let mut driver = RecordingDriver::new().with_missing_file("gone.mp3");

        assert!(driver.dispatch(&play("here.mp3")).is_ok());
        assert!(matches!(
            driver.dispatch(&play("gone.mp3")),
            Err(DriverError::Rejected { slot: 0, .. })
        ));
        assert_eq!(driver.commands(), &[play("here.mp3")]);
    }

    #[test]
    fn test_boxed_driver() {
        let mut driver: Box<dyn PlaybackDriver + Send> = Box::new(RecordingDriver::new());
        assert!(driver.dispatch(&PlaybackCommand::Stop { slot: 0 }).is_ok());
    }
}
