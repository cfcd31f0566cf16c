//! JSON-lines observation ingress
//!
//! Each input line is one record in one of two shapes:
//!
//! - a *raddec* (radio decoding) as emitted by a BLE scanning hub, carrying
//!   the RSSI seen by each receiver and the raw advertising packets
//! - a flat record with a device id, a signal strength and either a hex
//!   payload or a plain URI
//!
//! Bad lines are logged and skipped; they never stop the stream.

use std::fmt;
use std::io::BufRead;

use proximity_runtime::{Clock, RuntimeError};
use proximity_scheduler::{DeviceId, Observation};
use serde::Deserialize;
use thiserror::Error;

/// Bytes in a BLE advertising PDU header
const PDU_HEADER_LEN: usize = 2;

/// Bytes in the advertiser address following the header
const ADVERTISER_ADDRESS_LEN: usize = 6;

/// Why a line could not be turned into an observation
#[derive(Error, Debug)]
pub enum IngressError {
    #[error("Invalid JSON record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid hex payload: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Radio decoding has no RSSI readings")]
    EmptySignature,

    #[error("Advertising packet too short: {0} bytes")]
    ShortPacket(usize),
}

/// One input record
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IngressRecord {
    Raddec(Raddec),
    Flat(FlatObservation),
}

/// Radio decoding: one transmitter as seen by one or more receivers
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Raddec {
    pub transmitter_id: String,
    pub transmitter_id_type: IdType,
    pub rssi_signature: Vec<RssiReading>,
    #[serde(default)]
    pub packets: Vec<String>,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

/// Transmitter id type, numeric in most feeds
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IdType {
    Code(u64),
    Name(String),
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{}", code),
            Self::Name(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RssiReading {
    #[serde(default)]
    pub receiver_id: Option<String>,
    pub rssi: i32,
}

/// Already-reduced observation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatObservation {
    pub device_id: String,
    pub signal_strength: i32,
    #[serde(default)]
    pub timestamp: Option<u64>,
    /// Hex-encoded advertised payload
    #[serde(default)]
    pub payload: Option<String>,
    /// Plain-text file reference, used when there is no `payload`
    #[serde(default)]
    pub uri: Option<String>,
}

impl IngressRecord {
    /// Parse one line
    pub fn parse(line: &str) -> Result<Self, IngressError> {
        Ok(serde_json::from_str(line)?)
    }

    /// Reduce to an observation; records without a timestamp get `now`
    pub fn into_observation(self, now: u64) -> Result<Observation, IngressError> {
        match self {
            Self::Raddec(raddec) => raddec.into_observation(now),
            Self::Flat(flat) => flat.into_observation(now),
        }
    }
}

impl Raddec {
    /// Strongest reading across all receivers
    pub fn strongest_rssi(&self) -> Option<i32> {
        self.rssi_signature.iter().map(|reading| reading.rssi).max()
    }

    fn into_observation(self, now: u64) -> Result<Observation, IngressError> {
        let rssi = self.strongest_rssi().ok_or(IngressError::EmptySignature)?;

        let mut payload = Vec::new();
        for packet in &self.packets {
            payload.extend_from_slice(advertising_data_of(&hex::decode(packet)?)?);
        }

        Ok(Observation::new(
            DeviceId::from_signature(&self.transmitter_id, &self.transmitter_id_type),
            rssi,
            self.timestamp.unwrap_or(now),
            payload,
        ))
    }
}

impl FlatObservation {
    fn into_observation(self, now: u64) -> Result<Observation, IngressError> {
        let payload = match (self.payload, self.uri) {
            (Some(hex_payload), _) => hex::decode(hex_payload.trim())?,
            (None, Some(uri)) => uri.into_bytes(),
            (None, None) => Vec::new(),
        };

        Ok(Observation::new(
            self.device_id,
            self.signal_strength,
            self.timestamp.unwrap_or(now),
            payload,
        ))
    }
}

/// Advertising data of one PDU: header and advertiser address stripped,
/// truncated to the length the header declares
fn advertising_data_of(packet: &[u8]) -> Result<&[u8], IngressError> {
    let start = PDU_HEADER_LEN + ADVERTISER_ADDRESS_LEN;
    if packet.len() < start {
        return Err(IngressError::ShortPacket(packet.len()));
    }

    let declared = PDU_HEADER_LEN + usize::from(packet[1] & 0x3f);
    let end = declared.clamp(start, packet.len());
    Ok(&packet[start..end])
}

/// Counts from one run of [`pump`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngressStats {
    pub accepted: usize,
    pub skipped: usize,
}

/// How record timestamps are treated
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Timestamps {
    /// Use the record's timestamp, or arrival time when it has none
    #[default]
    FromRecord,
    /// Always use arrival time; for replaying captured feeds
    Arrival,
}

/// Read records until end of input, handing each observation to `sink`
///
/// Stops early, with an error, only when `sink` refuses an observation
/// (the scheduler has stopped) or the input cannot be read.
pub fn pump<B, C, S>(
    input: B,
    clock: &C,
    timestamps: Timestamps,
    mut sink: S,
) -> anyhow::Result<IngressStats>
where
    B: BufRead,
    C: Clock,
    S: FnMut(Observation) -> Result<(), RuntimeError>,
{
    let mut stats = IngressStats::default();

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let now = clock.now_ms();
        let observation = IngressRecord::parse(line)
            .and_then(|record| record.into_observation(now))
            .map(|mut observation| {
                if timestamps == Timestamps::Arrival {
                    observation.timestamp = now;
                }
                observation
            });

        match observation {
            Ok(observation) => {
                sink(observation)?;
                stats.accepted += 1;
            }
            Err(e) => {
                tracing::warn!("Skipping input line {}: {}", index + 1, e);
                stats.skipped += 1;
            }
        }
    }

    tracing::debug!(
        "Input ended: {} observation(s), {} line(s) skipped",
        stats.accepted,
        stats.skipped
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn fixed_clock() -> u64 {
        7_000
    }

    /// ADV_IND carrying flags plus a complete local name "hi"
    const PACKET: &str = "420d01020304050602010603096869";

    #[test]
    fn test_raddec_uses_strongest_rssi_and_signature_id() {
        let line = r#"{
            "transmitterId": "AABBCCDDEEFF",
            "transmitterIdType": 2,
            "rssiSignature": [
                { "receiverId": "r1", "receiverIdType": 2, "rssi": -72 },
                { "receiverId": "r2", "receiverIdType": 2, "rssi": -61 }
            ],
            "packets": [],
            "timestamp": 1000
        }"#;

        let observation = IngressRecord::parse(line)
            .unwrap()
            .into_observation(fixed_clock())
            .unwrap();

        assert_eq!(observation.device_id, DeviceId::new("aabbccddeeff/2"));
        assert_eq!(observation.signal_strength, -61);
        assert_eq!(observation.timestamp, 1_000);
        assert!(observation.raw_payload.is_empty());
    }

    #[test]
    fn test_raddec_packets_are_stripped_and_joined() {
        let line = format!(
            r#"{{"transmitterId":"a","transmitterIdType":3,"rssiSignature":[{{"rssi":-70}}],"packets":["{0}","{0}"]}}"#,
            PACKET
        );

        let observation = IngressRecord::parse(&line)
            .unwrap()
            .into_observation(fixed_clock())
            .unwrap();

        let once = [0x02, 0x01, 0x06, 0x03, 0x09, b'h', b'i'];
        assert_eq!(observation.raw_payload, [&once[..], &once[..]].concat());
        assert_eq!(observation.timestamp, 7_000);
    }

    #[test]
    fn test_declared_length_truncates_padding() {
        // header says 8 bytes of payload: address plus "02 01"
        let packet = hex::decode("4208010203040506020106000000").unwrap();
        assert_eq!(advertising_data_of(&packet).unwrap(), &[0x02, 0x01]);
    }

    #[test]
    fn test_empty_signature_is_rejected() {
        let line = r#"{"transmitterId":"a","transmitterIdType":2,"rssiSignature":[]}"#;
        assert!(matches!(
            IngressRecord::parse(line).unwrap().into_observation(0),
            Err(IngressError::EmptySignature)
        ));
    }

    #[rstest]
    #[case(r#"{"deviceId":"b1","signalStrength":-65,"uri":"tour/stop-1.mp3"}"#, b"tour/stop-1.mp3".to_vec())]
    #[case(r#"{"deviceId":"b1","signalStrength":-65,"payload":"782e6d7033"}"#, b"x.mp3".to_vec())]
    #[case(r#"{"deviceId":"b1","signalStrength":-65}"#, Vec::new())]
    fn test_flat_records(#[case] line: &str, #[case] payload: Vec<u8>) {
        let observation = IngressRecord::parse(line).unwrap().into_observation(5).unwrap();

        assert_eq!(observation.device_id, DeviceId::new("b1"));
        assert_eq!(observation.signal_strength, -65);
        assert_eq!(observation.timestamp, 5);
        assert_eq!(observation.raw_payload, payload);
    }

    #[test]
    fn test_pump_skips_bad_lines() {
        let input = concat!(
            "{\"deviceId\":\"b1\",\"signalStrength\":-60,\"timestamp\":1,\"uri\":\"a.mp3\"}\n",
            "not json\n",
            "\n",
            "{\"deviceId\":\"b2\",\"signalStrength\":-70,\"payload\":\"zz\"}\n",
            "{\"deviceId\":\"b3\",\"signalStrength\":-75,\"timestamp\":2,\"uri\":\"c.mp3\"}\n",
        );

        let mut received = Vec::new();
        let stats = pump(input.as_bytes(), &fixed_clock, Timestamps::FromRecord, |o| {
            received.push(o);
            Ok(())
        })
        .unwrap();

        assert_eq!(stats, IngressStats { accepted: 2, skipped: 2 });
        let ids: Vec<&str> = received.iter().map(|o| o.device_id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b3"]);
    }

    #[test]
    fn test_pump_can_restamp_captured_records() {
        let input = "{\"deviceId\":\"b1\",\"signalStrength\":-60,\"timestamp\":1,\"uri\":\"a.mp3\"}\n";

        let mut received = Vec::new();
        pump(input.as_bytes(), &fixed_clock, Timestamps::Arrival, |o| {
            received.push(o);
            Ok(())
        })
        .unwrap();

        assert_eq!(received[0].timestamp, 7_000);
    }

    #[test]
    fn test_pump_stops_when_sink_closes() {
        let input = "{\"deviceId\":\"b1\",\"signalStrength\":-60,\"uri\":\"a.mp3\"}\n";
        let result = pump(input.as_bytes(), &fixed_clock, Timestamps::FromRecord, |_| {
            Err(RuntimeError::ChannelClosed)
        });
        assert!(result.is_err());
    }
}
