//! Field delimiter detection

use tracing::debug;

use ed_core::FileHandle;

use super::encoding::{TextEncoding, PERMISSIVE};

/// Delimiters considered when none could be chosen from the probe
const SNIFF_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];
const SNIFF_LINES: usize = 20;

/// Result of probing the start of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterProbe {
    /// `None` leaves the choice to the parser
    pub delimiter: Option<u8>,
    /// Encoding to use from here on; downgraded if the probe failed to decode
    pub encoding: TextEncoding,
}

/// Count `;` and `,` in the first `probe_bytes` bytes of the handle
pub fn detect_delimiter(handle: &mut FileHandle, encoding: TextEncoding, probe_bytes: usize) -> DelimiterProbe {
    handle.reset();
    let probe = handle.read_bytes(Some(probe_bytes));
    handle.reset();

    let truncated = (probe.len() as u64) < handle.size();
    let (text, encoding) = match encoding.decode_prefix(&probe, truncated) {
        Some(text) => (text, encoding),
        None => {
            debug!("Probe of {} is not {}, reading as {}", handle.name(), encoding.name(), PERMISSIVE.name());
            (encoding_rs::mem::decode_latin1(&probe), PERMISSIVE)
        }
    };

    DelimiterProbe {
        delimiter: choose_delimiter(&text),
        encoding,
    }
}

/// `;` when strictly more frequent than `,`, otherwise `,` if present at all
pub fn choose_delimiter(text: &str) -> Option<u8> {
    let semicolons = text.matches(';').count();
    let commas = text.matches(',').count();

    if semicolons > commas {
        Some(b';')
    } else if commas > 0 {
        Some(b',')
    } else {
        None
    }
}

/// Guess a delimiter for text where neither `;` nor `,` was chosen.
///
/// Picks the candidate that splits the leading lines into the same number
/// of fields, preferring more fields; defaults to `,`.
pub fn infer_delimiter(text: &str) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    SNIFF_CANDIDATES
        .iter()
        .filter_map(|&candidate| {
            let mut counts = lines.iter().map(|line| line.bytes().filter(|&b| b == candidate).count());
            let first = counts.next()?;
            (first > 0 && counts.all(|count| count == first)).then_some((candidate, first))
        })
        .max_by_key(|&(_, count)| count)
        .map(|(candidate, _)| candidate)
        .unwrap_or(b',')
}
