//! Column typing for decoded text tables

use std::sync::Arc;
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use ahash::AHashSet;

use crate::config::NullConfig;
use crate::DataError;

/// Infers a column type from string cells and builds typed Arrow arrays
pub struct SchemaDetector<'a> {
    nulls: &'a NullConfig,
}

impl<'a> SchemaDetector<'a> {
    pub fn new(nulls: &'a NullConfig) -> Self {
        Self { nulls }
    }

    /// Build a typed batch from header names and string rows.
    ///
    /// Rows shorter than the header are treated as missing trailing cells.
    pub fn typed_batch(&self, headers: &[String], rows: &[Vec<String>]) -> Result<RecordBatch, DataError> {
        let mut fields = Vec::with_capacity(headers.len());
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(headers.len());

        for (col_idx, header) in headers.iter().enumerate() {
            let data_type = self.detect_column_type(rows, col_idx);
            columns.push(self.build_column(rows, col_idx, &data_type));
            fields.push(Field::new(header, data_type, true));
        }

        batch_from_columns(fields, columns, rows.len())
    }

    /// Detect column type from all non-missing values
    fn detect_column_type(&self, rows: &[Vec<String>], col_idx: usize) -> DataType {
        let mut seen_value = false;
        let mut is_bool = true;
        let mut is_int = true;
        let mut is_float = true;

        for row in rows {
            let Some(value) = row.get(col_idx) else {
                continue;
            };
            if self.nulls.is_null(value) {
                continue;
            }
            seen_value = true;

            let value = value.trim();
            if is_bool && parse_bool(value).is_none() {
                is_bool = false;
            }
            if is_int && value.parse::<i64>().is_err() {
                is_int = false;
            }
            if is_float && value.parse::<f64>().is_err() {
                is_float = false;
            }
            if !is_bool && !is_int && !is_float {
                break;
            }
        }

        if !seen_value {
            DataType::Utf8
        } else if is_bool {
            DataType::Boolean
        } else if is_int {
            DataType::Int64
        } else if is_float {
            DataType::Float64
        } else {
            DataType::Utf8
        }
    }

    fn cell<'r>(&self, row: &'r [String], col_idx: usize) -> Option<&'r str> {
        row.get(col_idx)
            .map(String::as_str)
            .filter(|value| !self.nulls.is_null(value))
    }

    fn build_column(&self, rows: &[Vec<String>], col_idx: usize, data_type: &DataType) -> ArrayRef {
        match data_type {
            DataType::Boolean => {
                let mut builder = BooleanBuilder::with_capacity(rows.len());
                for row in rows {
                    builder.append_option(self.cell(row, col_idx).and_then(|v| parse_bool(v.trim())));
                }
                Arc::new(builder.finish())
            }
            DataType::Int64 => {
                let mut builder = Int64Builder::with_capacity(rows.len());
                for row in rows {
                    builder.append_option(self.cell(row, col_idx).and_then(|v| v.trim().parse::<i64>().ok()));
                }
                Arc::new(builder.finish())
            }
            DataType::Float64 => {
                let mut builder = Float64Builder::with_capacity(rows.len());
                for row in rows {
                    builder.append_option(self.cell(row, col_idx).and_then(|v| v.trim().parse::<f64>().ok()));
                }
                Arc::new(builder.finish())
            }
            _ => {
                let mut builder = StringBuilder::new();
                for row in rows {
                    builder.append_option(self.cell(row, col_idx));
                }
                Arc::new(builder.finish())
            }
        }
    }
}

/// Build an all-string batch with no missing-value interpretation.
///
/// Short rows are padded with empty strings and long rows truncated.
pub fn raw_string_batch(headers: &[String], rows: &[Vec<String>]) -> Result<RecordBatch, DataError> {
    let fields = headers
        .iter()
        .map(|h| Field::new(h, DataType::Utf8, true))
        .collect::<Vec<_>>();

    let columns = (0..headers.len())
        .map(|col_idx| {
            let mut builder = StringBuilder::new();
            for row in rows {
                builder.append_value(row.get(col_idx).map(String::as_str).unwrap_or(""));
            }
            Arc::new(builder.finish()) as ArrayRef
        })
        .collect::<Vec<_>>();

    batch_from_columns(fields, columns, rows.len())
}

pub(crate) fn batch_from_columns(
    fields: Vec<Field>,
    columns: Vec<ArrayRef>,
    row_count: usize,
) -> Result<RecordBatch, DataError> {
    let options = RecordBatchOptions::new().with_row_count(Some(row_count));
    RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), columns, &options)
        .map_err(|e| e.into())
}

/// Make header names non-empty and unique.
///
/// Blank names become `Unnamed: <index>`; repeats get `.1`, `.2`, … suffixes.
pub fn normalize_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = AHashSet::new();
    let mut headers = Vec::new();

    for (idx, name) in raw.into_iter().enumerate() {
        let name = name.as_ref().trim();
        let base = if name.is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            name.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(candidate.clone());
        headers.push(candidate);
    }

    headers
}

/// Label shown to analysts for a column's storage type
pub fn type_label(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::Boolean => "bool",
        DataType::Int64 | DataType::Int32 => "int64",
        DataType::Float64 | DataType::Float32 => "float64",
        DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64 => "datetime",
        DataType::Utf8 | DataType::LargeUtf8 => "string",
        _ => "object",
    }
}

/// Timestamp type used for spreadsheet dates
pub fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Millisecond, None)
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::AsArray;
    use arrow::datatypes::{Float64Type, Int64Type};

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_type_detection() {
        let nulls = NullConfig::default();
        let detector = SchemaDetector::new(&nulls);
        let batch = detector
            .typed_batch(
                &headers(&["id", "ratio", "active", "name", "empty"]),
                &rows(&[
                    &["1", "0.5", "True", "Amsterdam", ""],
                    &["2", "", "false", "Utrecht", "NA"],
                    &["3", "7", "TRUE", "10", ""],
                ]),
            )
            .unwrap();

        let schema = batch.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(1).data_type(), &DataType::Float64);
        assert_eq!(schema.field(2).data_type(), &DataType::Boolean);
        assert_eq!(schema.field(3).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(4).data_type(), &DataType::Utf8);

        assert_eq!(batch.column(0).as_primitive::<Int64Type>().value(2), 3);
        assert_eq!(batch.column(1).null_count(), 1);
        assert_eq!(batch.column(1).as_primitive::<Float64Type>().value(2), 7.0);
        assert_eq!(batch.column(4).null_count(), 3);
    }

    #[test]
    fn test_short_rows_are_missing() {
        let nulls = NullConfig::default();
        let batch = SchemaDetector::new(&nulls)
            .typed_batch(&headers(&["a", "b"]), &rows(&[&["1", "2"], &["3"]]))
            .unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.column(1).null_count(), 1);
    }

    #[test]
    fn test_raw_string_batch_keeps_empty_cells() {
        let batch = raw_string_batch(&headers(&["a", "b"]), &rows(&[&["", "NA"], &["x"]])).unwrap();
        assert_eq!(batch.column(0).null_count(), 0);
        assert_eq!(batch.column(1).as_string::<i32>().value(0), "NA");
        assert_eq!(batch.column(1).as_string::<i32>().value(1), "");
    }

    #[test]
    fn test_normalize_headers() {
        let names = normalize_headers(["id", "", "id", " waarde ", "id"]);
        assert_eq!(names, vec!["id", "Unnamed: 1", "id.1", "waarde", "id.2"]);
    }
}
