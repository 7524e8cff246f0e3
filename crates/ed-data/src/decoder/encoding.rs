//! Text encoding detection

use std::borrow::Cow;
use encoding_rs::{ISO_8859_15, UTF_8, WINDOWS_1252};
use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use ed_core::FileHandle;

/// Encodings the decoder knows how to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextEncoding {
    Utf8,
    Iso8859_1,
    Windows1252,
    Iso8859_15,
}

/// Tried in order; the first one that decodes the sample wins
pub const CANDIDATES: [TextEncoding; 4] = [
    TextEncoding::Utf8,
    TextEncoding::Iso8859_1,
    TextEncoding::Windows1252,
    TextEncoding::Iso8859_15,
];

/// Maps every byte to a character, so decoding with it cannot fail
pub const PERMISSIVE: TextEncoding = TextEncoding::Iso8859_1;

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Iso8859_1 => "iso-8859-1",
            TextEncoding::Windows1252 => "windows-1252",
            TextEncoding::Iso8859_15 => "iso-8859-15",
        }
    }

    /// Decode without replacement characters; `None` on malformed input
    pub fn decode_strict<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match self {
            TextEncoding::Utf8 => UTF_8.decode_without_bom_handling_and_without_replacement(bytes),
            TextEncoding::Iso8859_1 => Some(encoding_rs::mem::decode_latin1(bytes)),
            TextEncoding::Windows1252 => WINDOWS_1252.decode_without_bom_handling_and_without_replacement(bytes),
            TextEncoding::Iso8859_15 => ISO_8859_15.decode_without_bom_handling_and_without_replacement(bytes),
        }
    }

    /// Strict decode of a prefix cut from a longer buffer.
    ///
    /// When `truncated`, a UTF-8 sequence split by the cut is dropped instead
    /// of counting as malformed. This is looser than a plain strict decode,
    /// which would reject such a sample.
    pub fn decode_prefix<'a>(&self, bytes: &'a [u8], truncated: bool) -> Option<Cow<'a, str>> {
        if *self == TextEncoding::Utf8 && truncated {
            if let Err(err) = std::str::from_utf8(bytes) {
                if err.error_len().is_none() {
                    return self.decode_strict(&bytes[..err.valid_up_to()]);
                }
            }
        }
        self.decode_strict(bytes)
    }
}

/// Pick the first candidate that decodes the leading `sample_bytes` of the handle.
///
/// Never fails: falls back to [`PERMISSIVE`].
pub fn detect_encoding(handle: &mut FileHandle, sample_bytes: usize) -> TextEncoding {
    handle.reset();
    let sample = handle.read_bytes(Some(sample_bytes));
    handle.reset();

    let truncated = (sample.len() as u64) < handle.size();
    for candidate in CANDIDATES {
        if candidate.decode_prefix(&sample, truncated).is_some() {
            debug!("Detected encoding {} for {}", candidate.name(), handle.name());
            return candidate;
        }
    }

    warn!("No candidate encoding fits {}, using {}", handle.name(), PERMISSIVE.name());
    PERMISSIVE
}
