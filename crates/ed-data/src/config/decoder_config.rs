//! Decoder tuning

use serde::{Serialize, Deserialize};

use super::null_handling::NullConfig;

/// Bytes sampled for encoding detection
pub const ENCODING_SAMPLE_BYTES: usize = 10_000;
/// Bytes inspected for delimiter detection
pub const DELIMITER_PROBE_BYTES: usize = 1_000;

/// Configuration for [`crate::TabularDecoder`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Size of the prefix tried against each candidate encoding
    pub encoding_sample_bytes: usize,

    /// Size of the prefix in which `;` and `,` are counted
    pub delimiter_probe_bytes: usize,

    /// Values treated as missing by the structured parse
    pub null_config: NullConfig,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            encoding_sample_bytes: ENCODING_SAMPLE_BYTES,
            delimiter_probe_bytes: DELIMITER_PROBE_BYTES,
            null_config: NullConfig::default(),
        }
    }
}
