//! Validated file URI type
//!
//! A `FileUri` can only be built from text or a path that points at a
//! playable local audio file, so holding one is proof of playability as far
//! as the scheduler is concerned. Whether the file actually exists is the
//! playback driver's problem.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};
use url::Url;

use crate::error::{DecodeError, DecodeResult};

/// Audio file extensions the playback side understands (compared case-insensitively)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3"];

const FILE_SCHEME: &str = "file";

/// URI of a local audio file with a supported extension
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileUri(Url);

impl FileUri {
    /// Parse and validate a URI string such as `file:///data/audio/intro.mp3`
    pub fn parse(text: &str) -> DecodeResult<Self> {
        let url = Url::parse(text.trim()).map_err(|e| DecodeError::InvalidUri(format!("{text}: {e}")))?;
        Self::from_url(url)
    }

    /// Build from an absolute filesystem path
    pub fn from_path(path: impl AsRef<Path>) -> DecodeResult<Self> {
        let path = path.as_ref();
        let url = Url::from_file_path(path)
            .map_err(|_| DecodeError::InvalidUri(path.display().to_string()))?;
        Self::from_url(url)
    }

    fn from_url(url: Url) -> DecodeResult<Self> {
        if url.scheme() != FILE_SCHEME {
            return Err(DecodeError::UnsupportedScheme(url.scheme().to_string()));
        }

        if !has_supported_extension(&url) {
            return Err(DecodeError::UnsupportedExtension(url.to_string()));
        }

        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Local path the URI points at, if it maps onto this platform's paths
    pub fn to_file_path(&self) -> Option<PathBuf> {
        self.0.to_file_path().ok()
    }

    /// Final path segment, e.g. `intro.mp3`
    pub fn file_name(&self) -> &str {
        self.0
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
    }
}

fn has_supported_extension(url: &Url) -> bool {
    let Some(file_name) = url.path_segments().and_then(|mut s| s.next_back()) else {
        return false;
    };

    match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => SUPPORTED_EXTENSIONS
            .iter()
            .any(|supported| extension.eq_ignore_ascii_case(supported)),
        _ => false,
    }
}

/// Whether a plain file name or relative path carries a supported extension
pub fn is_supported_file_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

impl fmt::Display for FileUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for FileUri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl TryFrom<&str> for FileUri {
    type Error = DecodeError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        FileUri::parse(text)
    }
}
