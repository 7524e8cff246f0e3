//! Column overviews and per-file summaries shown on the files page

use std::hash::Hash;
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float64Type, Int64Type, TimeUnit, TimestampMillisecondType};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use ahash::AHashSet;
use serde::Serialize;
use tracing::warn;

use ed_core::{Category, FileHandle, FileKind};

use crate::decoder::{ParseMode, TabularDecoder};
use crate::schema::type_label;

/// One row of the column overview table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnOverview {
    pub name: String,
    pub data_type: &'static str,
    /// Total number of rows, missing ones included
    pub count: usize,
    pub missing: usize,
    /// Distinct non-missing values
    pub distinct: usize,
}

/// Describe every column of a batch, in column order
pub fn column_overview(batch: &RecordBatch) -> Vec<ColumnOverview> {
    batch
        .schema()
        .fields()
        .iter()
        .zip(batch.columns())
        .map(|(field, column)| ColumnOverview {
            name: field.name().clone(),
            data_type: type_label(field.data_type()),
            count: column.len(),
            missing: column.null_count(),
            distinct: distinct_count(column.as_ref()),
        })
        .collect()
}

fn count_unique<T: Hash + Eq>(values: impl Iterator<Item = Option<T>>) -> usize {
    values.flatten().collect::<AHashSet<T>>().len()
}

fn distinct_count(column: &dyn Array) -> usize {
    match column.data_type() {
        DataType::Boolean => count_unique(column.as_boolean().iter()),
        DataType::Int64 => count_unique(column.as_primitive::<Int64Type>().iter()),
        // NaN is missing for counting purposes; -0.0 and 0.0 are one value
        DataType::Float64 => count_unique(
            column
                .as_primitive::<Float64Type>()
                .iter()
                .map(|v| v.filter(|f| !f.is_nan()).map(|f| (f + 0.0).to_bits())),
        ),
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            count_unique(column.as_primitive::<TimestampMillisecondType>().iter())
        }
        DataType::Utf8 => count_unique(column.as_string::<i32>().iter()),
        _ => count_unique((0..column.len()).map(|i| {
            if column.is_null(i) {
                None
            } else {
                array_value_to_string(column, i).ok()
            }
        })),
    }
}

/// One row of the uploaded-files overview
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub category: Category,
    /// `Excel`, `CSV` or `Unknown`
    pub format: &'static str,
    pub size_bytes: u64,
    /// `None` when the file could not be read
    pub columns: Option<usize>,
    pub rows: Option<usize>,
}

impl FileSummary {
    /// Decode a handle and summarize it.
    ///
    /// Decoding failures are logged and leave `columns`/`rows` empty.
    pub fn describe(decoder: &TabularDecoder, handle: &mut FileHandle) -> Self {
        let kind = handle.kind();
        let mut summary = FileSummary {
            name: handle.name().to_string(),
            category: handle.category(),
            format: FileKind::format_label(kind),
            size_bytes: handle.size(),
            columns: None,
            rows: None,
        };

        match decoder.read(handle) {
            Ok(Some(table)) => {
                summary.columns = Some(table.num_columns());
                summary.rows = Some(match table.mode {
                    ParseMode::Spreadsheet => table.non_empty_rows(),
                    _ => table.num_rows(),
                });
            }
            Ok(None) => {}
            Err(err) => warn!("Could not summarize {}: {}", summary.name, err),
        }

        summary
    }

    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }

    /// Size as shown to the user, e.g. `1.50 KB`
    pub fn size_label(&self) -> String {
        format!("{:.2} KB", self.size_kb())
    }
}
