//! Commands sent to the playback driver

use std::fmt;

use proximity_decoder::FileUri;
use serde::Serialize;

/// One instruction for one player slot
///
/// Only emitted when a slot's state actually changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum PlaybackCommand {
    /// Start playing `file_uri` on `slot`, replacing whatever it played
    Play {
        slot: usize,
        file_uri: FileUri,
        volume: u8,
    },
    /// Stop `slot` and leave it idle
    Stop { slot: usize },
    /// Change the volume of what `slot` is already playing
    SetVolume { slot: usize, volume: u8 },
}

impl PlaybackCommand {
    pub fn slot(&self) -> usize {
        match self {
            PlaybackCommand::Play { slot, .. }
            | PlaybackCommand::Stop { slot }
            | PlaybackCommand::SetVolume { slot, .. } => *slot,
        }
    }

    pub fn is_play(&self) -> bool {
        matches!(self, PlaybackCommand::Play { .. })
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, PlaybackCommand::Stop { .. })
    }
}

impl fmt::Display for PlaybackCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackCommand::Play {
                slot,
                file_uri,
                volume,
            } => write!(f, "Play({}, {}, {})", slot, file_uri, volume),
            PlaybackCommand::Stop { slot } => write!(f, "Stop({})", slot),
            PlaybackCommand::SetVolume { slot, volume } => {
                write!(f, "SetVolume({}, {})", slot, volume)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let play = PlaybackCommand::Play {
            slot: 0,
            file_uri: FileUri::parse("file:///a.mp3").unwrap(),
            volume: 100,
        };
        assert_eq!(play.to_string(), "Play(0, file:///a.mp3, 100)");
        assert_eq!(PlaybackCommand::Stop { slot: 1 }.to_string(), "Stop(1)");
        assert_eq!(
            PlaybackCommand::SetVolume { slot: 1, volume: 40 }.to_string(),
            "SetVolume(1, 40)"
        );
    }

    #[test]
    fn test_slot_accessor() {
        assert_eq!(PlaybackCommand::Stop { slot: 4 }.slot(), 4);
        assert_eq!(PlaybackCommand::SetVolume { slot: 2, volume: 9 }.slot(), 2);
    }

    #[test]
    fn test_serializes_tagged() {
        let json = serde_json::to_string(&PlaybackCommand::SetVolume { slot: 1, volume: 40 }).unwrap();
        assert_eq!(json, r#"{"command":"set_volume","slot":1,"volume":40}"#);
    }
}
