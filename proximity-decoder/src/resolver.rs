//! Payload to file URI resolution
//!
//! Most beacons in range carry nothing playable, so a failed resolution is
//! an expected outcome and is reported as `None` rather than an error.

use std::path::{Component, Path, PathBuf};

use crate::advertising::{advertising_data, uri_text};
use crate::error::{DecodeError, DecodeResult};
use crate::file_uri::{is_supported_file_name, FileUri};

/// Default directory bare file names are resolved against
pub const DEFAULT_AUDIO_ROOT: &str = "./data/audio/";

/// Turns a raw advertised payload into a playable file URI
pub trait PayloadResolver {
    /// Resolve a payload, or `None` if it carries nothing playable
    fn resolve(&self, payload: &[u8]) -> Option<FileUri>;
}

impl<F> PayloadResolver for F
where
    F: Fn(&[u8]) -> Option<FileUri>,
{
    fn resolve(&self, payload: &[u8]) -> Option<FileUri> {
        self(payload)
    }
}

/// Resolver for payloads naming `.mp3` files, either as a `file:` URI or as a
/// name relative to an audio root directory
///
/// # Example
///
/// ```rust
/// use proximity_decoder::{Mp3FileResolver, PayloadResolver};
///
/// let resolver = Mp3FileResolver::new("/srv/audio");
/// let uri = resolver.resolve(b"welcome.mp3").unwrap();
/// assert_eq!(uri.as_str(), "file:///srv/audio/welcome.mp3");
///
/// assert!(resolver.resolve(b"file:///song.wav").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Mp3FileResolver {
    audio_root: PathBuf,
}

impl Mp3FileResolver {
    /// Create a resolver rooted at `audio_root`
    ///
    /// Relative roots are anchored to the current working directory.
    pub fn new(audio_root: impl AsRef<Path>) -> Self {
        let audio_root = audio_root.as_ref();
        let audio_root = std::path::absolute(audio_root).unwrap_or_else(|_| audio_root.to_path_buf());

        Self {
            audio_root: normalize(&audio_root),
        }
    }

    pub fn audio_root(&self) -> &Path {
        &self.audio_root
    }

    /// Resolve with the reason for failure kept
    pub fn try_resolve(&self, payload: &[u8]) -> DecodeResult<FileUri> {
        let candidate = candidate_text(payload)?;

        if looks_like_uri(candidate) {
            FileUri::parse(candidate)
        } else {
            self.resolve_name(candidate)
        }
    }

    fn resolve_name(&self, name: &str) -> DecodeResult<FileUri> {
        if !is_supported_file_name(name) {
            return Err(DecodeError::UnsupportedExtension(name.to_string()));
        }

        let relative = Path::new(name);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(DecodeError::OutsideAudioRoot(name.to_string()));
        }

        FileUri::from_path(self.audio_root.join(relative))
    }
}

impl Default for Mp3FileResolver {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIO_ROOT)
    }
}

impl PayloadResolver for Mp3FileResolver {
    fn resolve(&self, payload: &[u8]) -> Option<FileUri> {
        match self.try_resolve(payload) {
            Ok(uri) => Some(uri),
            Err(e) => {
                tracing::trace!("Payload did not resolve to a playable file: {}", e);
                None
            }
        }
    }
}

/// Pick the text that should name a file: a URI advertising structure if the
/// payload carries one, otherwise the payload itself read as text
fn candidate_text(payload: &[u8]) -> DecodeResult<&str> {
    if let Ok(structures) = advertising_data(payload) {
        if let Some(text) = uri_text(&structures) {
            return non_empty(text);
        }
    }

    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::InvalidUtf8)?;
    non_empty(text.trim_end_matches('\0'))
}

fn non_empty(text: &str) -> DecodeResult<&str> {
    let text = text.trim();
    if text.is_empty() || text.chars().any(char::is_control) {
        Err(DecodeError::NoFileReference)
    } else {
        Ok(text)
    }
}

fn looks_like_uri(text: &str) -> bool {
    text.contains("://")
        || text
            .get(..5)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("file:"))
}

/// Drop `.` components so joined paths render cleanly in URIs
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advertising::{AD_TYPE_URI, URI_SCHEME_EMPTY};

    fn resolver() -> Mp3FileResolver {
        Mp3FileResolver::new("/srv/audio")
    }

    #[test]
    fn test_bare_name_joins_audio_root() {
        let uri = resolver().resolve(b"tour/stop-1.mp3").unwrap();
        assert_eq!(uri.as_str(), "file:///srv/audio/tour/stop-1.mp3");
    }

    #[test]
    fn test_full_uri_is_taken_verbatim() {
        let uri = resolver().resolve(b"file:///elsewhere/intro.mp3").unwrap();
        assert_eq!(uri.as_str(), "file:///elsewhere/intro.mp3");
    }

    #[test]
    fn test_wav_is_rejected() {
        assert_eq!(
            resolver().try_resolve(b"file:///song.wav").unwrap_err(),
            DecodeError::UnsupportedExtension("file:///song.wav".to_string())
        );
        assert!(resolver().resolve(b"song.wav").is_none());
    }

    #[test]
    fn test_parent_dir_is_rejected() {
        assert_eq!(
            resolver().try_resolve(b"../secret.mp3").unwrap_err(),
            DecodeError::OutsideAudioRoot("../secret.mp3".to_string())
        );
    }

    #[test]
    fn test_trailing_nuls_are_ignored() {
        let uri = resolver().resolve(b"intro.mp3\0\0\0").unwrap();
        assert_eq!(uri.file_name(), "intro.mp3");
    }

    #[test]
    fn test_binary_noise_resolves_to_nothing() {
        assert!(resolver().resolve(&[0xff, 0xfe, 0x00, 0x12]).is_none());
        assert!(resolver().resolve(&[]).is_none());
    }

    #[test]
    fn test_uri_advertising_structure() {
        let text = b"file:///srv/audio/ad.mp3";
        let mut payload = vec![0x02, 0x01, 0x06, (text.len() + 2) as u8, AD_TYPE_URI, URI_SCHEME_EMPTY];
        payload.extend_from_slice(text);

        let uri = resolver().resolve(&payload).unwrap();
        assert_eq!(uri.as_str(), "file:///srv/audio/ad.mp3");
    }

    #[test]
    fn test_relative_root_is_made_absolute() {
        let resolver = Mp3FileResolver::new("./data/audio/");
        assert!(resolver.audio_root().is_absolute());
        assert!(resolver.audio_root().ends_with("data/audio"));
    }

    #[test]
    fn test_closure_resolver() {
        let fixed = |_: &[u8]| FileUri::parse("file:///fixed.mp3").ok();
        assert_eq!(fixed.resolve(b"anything").unwrap().as_str(), "file:///fixed.mp3");
    }
}
