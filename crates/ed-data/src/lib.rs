//! File registry, shadow store and tabular decoding for the dashboard

pub mod config;
pub mod decoder;
pub mod overview;
pub mod registry;
pub mod schema;
pub mod store;

use arrow::error::ArrowError;
use thiserror::Error;

// Re-exports
pub use config::{DecoderConfig, NullConfig, StoreConfig};
pub use decoder::{ParseMode, ParsedTable, TabularDecoder, TextEncoding};
pub use overview::{ColumnOverview, FileSummary};
pub use registry::FileRegistry;
pub use store::{ManifestRecord, ShadowStore, StoreLookup};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    Arrow(ArrowError),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Error reading spreadsheet '{file}': {message}")]
    Spreadsheet { file: String, message: String },

    #[error("Could not read file '{0}'")]
    Unreadable(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => DataError::Csv(error.to_string()),
        }
    }
}

impl From<ArrowError> for DataError {
    fn from(error: ArrowError) -> Self {
        DataError::Arrow(error)
    }
}

impl From<serde_json::Error> for DataError {
    fn from(error: serde_json::Error) -> Self {
        DataError::Manifest(error.to_string())
    }
}
