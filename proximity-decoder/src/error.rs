//! Error types for payload decoding

use thiserror::Error;

/// Errors that can occur while turning a payload into a file URI
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Text could not be parsed as a URI at all
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// URI parsed, but uses a scheme other than `file`
    #[error("Unsupported URI scheme: {0}")]
    UnsupportedScheme(String),

    /// URI or path does not end in a supported audio extension
    #[error("Unsupported audio file extension: {0}")]
    UnsupportedExtension(String),

    /// Path escapes the configured audio root
    #[error("Path escapes audio root: {0}")]
    OutsideAudioRoot(String),

    /// Advertising data length bytes overrun the payload
    #[error("Malformed advertising data at offset {offset}: length {length} exceeds remaining {remaining} bytes")]
    MalformedAdvertisement {
        offset: usize,
        length: usize,
        remaining: usize,
    },

    /// Payload text is not valid UTF-8
    #[error("Payload is not valid UTF-8")]
    InvalidUtf8,

    /// Payload carried no candidate URI or file name
    #[error("Payload carries no file reference")]
    NoFileReference,
}

/// Result type alias for decoding operations
pub type DecodeResult<T> = Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let error = DecodeError::UnsupportedScheme("https".to_string());
        assert_eq!(error.to_string(), "Unsupported URI scheme: https");

        let error = DecodeError::MalformedAdvertisement {
            offset: 3,
            length: 9,
            remaining: 2,
        };
        assert_eq!(
            error.to_string(),
            "Malformed advertising data at offset 3: length 9 exceeds remaining 2 bytes"
        );

        assert_eq!(
            DecodeError::NoFileReference.to_string(),
            "Payload carries no file reference"
        );
    }
}
