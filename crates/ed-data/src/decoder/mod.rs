//! Turning uploaded bytes into tables
//!
//! Dispatch is by file name: spreadsheets go through calamine, `.csv` files
//! through a best-effort pipeline of encoding detection, delimiter
//! detection, a typed parse and finally a plain line split. Every stage
//! rewinds the handle before reading, so decoding the same handle twice
//! gives the same result.

pub mod delimited;
pub mod delimiter;
pub mod encoding;
pub mod spreadsheet;

pub use delimiter::DelimiterProbe;
pub use encoding::TextEncoding;

use arrow::array::ArrayRef;
use arrow::record_batch::RecordBatch;
use tracing::{debug, info, warn};

use ed_core::{FileHandle, FileKind};

use crate::config::DecoderConfig;
use crate::overview::{column_overview, ColumnOverview};
use crate::DataError;

/// Which path produced a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Typed CSV parse
    Structured,
    /// Manual line split, all cells raw strings
    LineSplit,
    /// First worksheet of a workbook
    Spreadsheet,
}

/// Decoded, column-oriented file content
#[derive(Debug, Clone)]
pub struct ParsedTable {
    /// Columns in file order with unique names
    pub batch: RecordBatch,
    pub mode: ParseMode,
    /// Text encoding used, `None` for spreadsheets
    pub encoding: Option<TextEncoding>,
    /// Delimiter chosen by detection, `None` when left to the parser
    pub detected_delimiter: Option<u8>,
    /// Delimiter the parse actually used
    pub delimiter: Option<u8>,
}

impl ParsedTable {
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> RecordBatch {
        self.batch.slice(0, n.min(self.batch.num_rows()))
    }

    /// Rows that are not entirely missing
    pub fn non_empty_rows(&self) -> usize {
        (0..self.batch.num_rows())
            .filter(|&row| self.batch.columns().iter().any(|col| col.is_valid(row)))
            .count()
    }

    pub fn overview(&self) -> Vec<ColumnOverview> {
        column_overview(&self.batch)
    }
}

/// Decodes registry handles into [`ParsedTable`]s
#[derive(Debug, Clone, Default)]
pub struct TabularDecoder {
    config: DecoderConfig,
}

impl TabularDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode `handle` as the kind implied by `file_name`.
    ///
    /// `Ok(None)` means the kind is not supported. Errors name the file and
    /// are meant to be shown to the user.
    pub fn read_table(&self, handle: &mut FileHandle, file_name: &str) -> Result<Option<ParsedTable>, DataError> {
        match FileKind::from_name(file_name) {
            Some(FileKind::Spreadsheet) => self.read_spreadsheet(handle, file_name).map(Some),
            Some(FileKind::DelimitedText) => self.read_delimited(handle, file_name).map(Some),
            None => {
                debug!("Skipping unsupported file {}", file_name);
                Ok(None)
            }
        }
    }

    /// Decode a handle using its own name for dispatch
    pub fn read(&self, handle: &mut FileHandle) -> Result<Option<ParsedTable>, DataError> {
        let name = handle.name().to_string();
        self.read_table(handle, &name)
    }

    /// Column overview of a file, `Ok(None)` for unsupported kinds
    pub fn column_overview(&self, handle: &mut FileHandle, file_name: &str) -> Result<Option<Vec<ColumnOverview>>, DataError> {
        Ok(self.read_table(handle, file_name)?.map(|table| table.overview()))
    }

    /// Run encoding and delimiter detection only
    pub fn probe(&self, handle: &mut FileHandle) -> DelimiterProbe {
        let encoding = encoding::detect_encoding(handle, self.config.encoding_sample_bytes);
        delimiter::detect_delimiter(handle, encoding, self.config.delimiter_probe_bytes)
    }

    fn read_spreadsheet(&self, handle: &mut FileHandle, file_name: &str) -> Result<ParsedTable, DataError> {
        handle.reset();
        let batch = spreadsheet::parse_spreadsheet(handle.get_buffer(), file_name)?;
        info!("Read {} rows x {} columns from {}", batch.num_rows(), batch.num_columns(), file_name);

        Ok(ParsedTable {
            batch,
            mode: ParseMode::Spreadsheet,
            encoding: None,
            detected_delimiter: None,
            delimiter: None,
        })
    }

    fn read_delimited(&self, handle: &mut FileHandle, file_name: &str) -> Result<ParsedTable, DataError> {
        let probe = self.probe(handle);

        handle.reset();
        let content = handle.read_bytes(None);
        match delimited::parse_structured(&content, probe.encoding, probe.delimiter, &self.config.null_config) {
            Ok((batch, delimiter)) => {
                info!(
                    "Read {} rows x {} columns from {} ({}, delimiter {:?})",
                    batch.num_rows(),
                    batch.num_columns(),
                    file_name,
                    probe.encoding.name(),
                    delimiter as char
                );
                Ok(ParsedTable {
                    batch,
                    mode: ParseMode::Structured,
                    encoding: Some(probe.encoding),
                    detected_delimiter: probe.delimiter,
                    delimiter: Some(delimiter),
                })
            }
            Err(err) => {
                warn!("Structured parse of {} failed ({}), splitting lines manually", file_name, err);

                handle.reset();
                let content = handle.read_bytes(None);
                let batch = delimited::parse_line_split(&content, probe.encoding)
                    .ok_or_else(|| DataError::Unreadable(file_name.to_string()))?;

                Ok(ParsedTable {
                    batch,
                    mode: ParseMode::LineSplit,
                    encoding: Some(probe.encoding),
                    detected_delimiter: probe.delimiter,
                    delimiter: None,
                })
            }
        }
    }
}
