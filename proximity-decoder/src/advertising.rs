//! BLE advertising data walker
//!
//! Advertising data is a sequence of `[length][type][data..]` structures where
//! `length` counts the type byte plus the data. A zero length byte marks the
//! start of padding and ends the walk.

use crate::error::{DecodeError, DecodeResult};

/// AD type for a URI (Bluetooth Core Specification Supplement, Part A 1.18)
pub const AD_TYPE_URI: u8 = 0x24;

/// AD type for the complete local name
pub const AD_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;

/// URI scheme code meaning "no scheme prefix, the text spells it out"
pub const URI_SCHEME_EMPTY: u8 = 0x01;

/// A single advertising data structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdStructure<'a> {
    pub ad_type: u8,
    pub data: &'a [u8],
}

/// Split advertising data into its structures
pub fn advertising_data(bytes: &[u8]) -> DecodeResult<Vec<AdStructure<'_>>> {
    let mut structures = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let length = bytes[offset] as usize;
        if length == 0 {
            break;
        }

        let remaining = bytes.len() - offset - 1;
        if length > remaining {
            return Err(DecodeError::MalformedAdvertisement {
                offset,
                length,
                remaining,
            });
        }

        structures.push(AdStructure {
            ad_type: bytes[offset + 1],
            data: &bytes[offset + 2..offset + 1 + length],
        });
        offset += 1 + length;
    }

    Ok(structures)
}

/// Text of the first URI structure with a spelled-out scheme
///
/// URI structures using a scheme code other than [`URI_SCHEME_EMPTY`] encode
/// well-known web schemes and can never name a local file, so they are skipped.
pub fn uri_text<'a>(structures: &[AdStructure<'a>]) -> Option<&'a str> {
    structures
        .iter()
        .filter(|s| s.ad_type == AD_TYPE_URI)
        .find_map(|s| match s.data.split_first() {
            Some((&URI_SCHEME_EMPTY, text)) => std::str::from_utf8(text).ok(),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri_structure(text: &str) -> Vec<u8> {
        let mut bytes = vec![(text.len() + 2) as u8, AD_TYPE_URI, URI_SCHEME_EMPTY];
        bytes.extend_from_slice(text.as_bytes());
        bytes
    }

    #[test]
    fn test_walks_flags_and_name() {
        // Flags (0x01 = 0x06) followed by complete local name "abc"
        let bytes = [0x02, 0x01, 0x06, 0x04, 0x09, b'a', b'b', b'c'];
        let structures = advertising_data(&bytes).unwrap();

        assert_eq!(structures.len(), 2);
        assert_eq!(structures[0].ad_type, 0x01);
        assert_eq!(structures[0].data, &[0x06]);
        assert_eq!(structures[1].ad_type, AD_TYPE_COMPLETE_LOCAL_NAME);
        assert_eq!(structures[1].data, b"abc");
    }

    #[test]
    fn test_zero_length_ends_walk() {
        let bytes = [0x02, 0x01, 0x06, 0x00, 0xff, 0xff];
        assert_eq!(advertising_data(&bytes).unwrap().len(), 1);
    }

    #[test]
    fn test_overrun_is_malformed() {
        let bytes = [0x02, 0x01, 0x06, 0x09, 0x09, b'a'];
        assert_eq!(
            advertising_data(&bytes),
            Err(DecodeError::MalformedAdvertisement {
                offset: 3,
                length: 9,
                remaining: 2,
            })
        );
    }

    #[test]
    fn test_empty_payload_has_no_structures() {
        assert!(advertising_data(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_uri_text_finds_spelled_out_scheme() {
        let mut bytes = vec![0x02, 0x01, 0x06];
        bytes.extend(uri_structure("file:///audio/a.mp3"));
        let structures = advertising_data(&bytes).unwrap();

        assert_eq!(uri_text(&structures), Some("file:///audio/a.mp3"));
    }

    #[test]
    fn test_uri_text_skips_coded_schemes() {
        // 0x17 is the scheme code for "https:"
        let bytes = [0x06, AD_TYPE_URI, 0x17, b'/', b'/', b'a', b'b'];
        let structures = advertising_data(&bytes).unwrap();

        assert_eq!(uri_text(&structures), None);
    }
}
