//! # proximity-decoder
//!
//! Turns what a beacon advertises into something the scheduler can play.
//!
//! A payload resolves to a [`FileUri`] when it names a local `.mp3` file,
//! either through a BLE URI advertising structure, a literal `file:` URI, or
//! a bare file name relative to the configured audio root. Everything else
//! resolves to nothing and the observation is ignored upstream.
//!
//! ```rust
//! use proximity_decoder::{FileUri, Mp3FileResolver, PayloadResolver};
//!
//! let resolver = Mp3FileResolver::new("/srv/audio");
//! assert!(resolver.resolve(b"file:///srv/audio/intro.mp3").is_some());
//! assert!(resolver.resolve(b"file:///song.wav").is_none());
//!
//! let uri = FileUri::parse("file:///srv/audio/intro.mp3").unwrap();
//! assert_eq!(uri.file_name(), "intro.mp3");
//! ```

pub mod advertising;
pub mod error;
pub mod file_uri;
pub mod resolver;

pub use advertising::{advertising_data, AdStructure};
pub use error::{DecodeError, DecodeResult};
pub use file_uri::{FileUri, SUPPORTED_EXTENSIONS};
pub use resolver::{Mp3FileResolver, PayloadResolver, DEFAULT_AUDIO_ROOT};
