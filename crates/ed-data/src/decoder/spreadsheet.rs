//! Spreadsheet (xlsx/xls) parsing

use std::io::Cursor;
use std::sync::Arc;
use arrow::array::*;
use arrow::datatypes::{DataType, Field};
use arrow::record_batch::RecordBatch;
use calamine::{open_workbook_auto_from_rs, Data, DataType as _, Range, Reader};
use chrono::NaiveDateTime;
use tracing::warn;

use crate::schema::{batch_from_columns, normalize_headers, timestamp_type};
use crate::DataError;

/// How the worksheet is picked
#[derive(Debug, Clone, Copy)]
enum SheetSelector {
    /// Explicit sheet index
    Position(usize),
    /// Whatever sheet the workbook lists first
    FirstListed,
}

/// Read the first worksheet into a typed batch, using its first row as headers.
///
/// A failed read is retried once without the explicit sheet index.
pub fn parse_spreadsheet(content: &[u8], file_name: &str) -> Result<RecordBatch, DataError> {
    let range = match load_range(content, SheetSelector::Position(0)) {
        Ok(range) => range,
        Err(err) => {
            warn!("Reading sheet 0 of {} failed ({}), retrying with the first listed sheet", file_name, err);
            load_range(content, SheetSelector::FirstListed).map_err(|err| DataError::Spreadsheet {
                file: file_name.to_string(),
                message: err.to_string(),
            })?
        }
    };

    range_to_batch(&range).map_err(|message| DataError::Spreadsheet {
        file: file_name.to_string(),
        message,
    })
}

fn load_range(content: &[u8], selector: SheetSelector) -> Result<Range<Data>, calamine::Error> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(content))?;
    match selector {
        SheetSelector::Position(idx) => workbook
            .worksheet_range_at(idx)
            .unwrap_or(Err(calamine::Error::Msg("workbook has no worksheets"))),
        SheetSelector::FirstListed => {
            let name = workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or(calamine::Error::Msg("workbook has no worksheets"))?;
            workbook.worksheet_range(&name)
        }
    }
}

fn range_to_batch(range: &Range<Data>) -> Result<RecordBatch, String> {
    let mut rows = range.rows();
    let header_row = rows.next().ok_or_else(|| "worksheet is empty".to_string())?;
    let headers = normalize_headers(header_row.iter().map(cell_text));
    let body: Vec<&[Data]> = rows.collect();

    let mut fields = Vec::with_capacity(headers.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(headers.len());
    for (col_idx, header) in headers.iter().enumerate() {
        let cells: Vec<Option<&Data>> = body
            .iter()
            .map(|row| row.get(col_idx).filter(|cell| !is_missing(cell)))
            .collect();
        let data_type = detect_cell_type(&cells);
        columns.push(build_column(&cells, &data_type));
        fields.push(Field::new(header, data_type, true));
    }

    batch_from_columns(fields, columns, body.len()).map_err(|e| e.to_string())
}

fn is_missing(cell: &Data) -> bool {
    match cell {
        Data::Empty | Data::Error(_) => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64
}

fn detect_cell_type(cells: &[Option<&Data>]) -> DataType {
    let present: Vec<&Data> = cells.iter().flatten().copied().collect();
    if present.is_empty() {
        return DataType::Utf8;
    }

    if present.iter().all(|c| matches!(c, Data::Bool(_))) {
        DataType::Boolean
    } else if present.iter().all(|c| match c {
        Data::Int(_) => true,
        Data::Float(f) => is_integral(*f),
        _ => false,
    }) {
        DataType::Int64
    } else if present.iter().all(|c| matches!(c, Data::Int(_) | Data::Float(_))) {
        DataType::Float64
    } else if present.iter().all(|c| matches!(c, Data::DateTime(_) | Data::DateTimeIso(_))) {
        timestamp_type()
    } else {
        DataType::Utf8
    }
}

fn to_millis(value: NaiveDateTime) -> i64 {
    value.and_utc().timestamp_millis()
}

fn build_column(cells: &[Option<&Data>], data_type: &DataType) -> ArrayRef {
    match data_type {
        DataType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(cells.len());
            for cell in cells {
                builder.append_option(cell.and_then(|c| c.get_bool()));
            }
            Arc::new(builder.finish())
        }
        DataType::Int64 => {
            let mut builder = Int64Builder::with_capacity(cells.len());
            for cell in cells {
                builder.append_option(cell.and_then(|c| match c {
                    Data::Int(i) => Some(*i),
                    Data::Float(f) => Some(*f as i64),
                    _ => None,
                }));
            }
            Arc::new(builder.finish())
        }
        DataType::Float64 => {
            let mut builder = Float64Builder::with_capacity(cells.len());
            for cell in cells {
                builder.append_option(cell.and_then(|c| c.as_f64()));
            }
            Arc::new(builder.finish())
        }
        DataType::Timestamp(_, _) => {
            let mut builder = TimestampMillisecondBuilder::with_capacity(cells.len());
            for cell in cells {
                builder.append_option(cell.and_then(|c| c.as_datetime()).map(to_millis));
            }
            Arc::new(builder.finish())
        }
        _ => {
            let mut builder = StringBuilder::new();
            for cell in cells {
                builder.append_option(cell.map(cell_text));
            }
            Arc::new(builder.finish())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(rows: Vec<Vec<Data>>) -> Range<Data> {
        let height = rows.len() as u32;
        let width = rows.iter().map(Vec::len).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in rows.into_iter().enumerate() {
            for (c, cell) in row.into_iter().enumerate() {
                range.set_value((r as u32, c as u32), cell);
            }
        }
        range
    }

    fn s(value: &str) -> Data {
        Data::String(value.to_string())
    }

    #[test]
    fn test_range_types() {
        let batch = range_to_batch(&range(vec![
            vec![s("jaar"), s("aantal"), s("aandeel"), s("actief"), s("opleiding")],
            vec![Data::Float(2023.0), Data::Int(12), Data::Float(0.25), Data::Bool(true), s("Zorg")],
            vec![Data::Float(2024.0), Data::Empty, Data::Int(1), Data::Bool(false), Data::Float(3.0)],
        ]))
        .unwrap();

        let schema = batch.schema();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(1).data_type(), &DataType::Int64);
        assert_eq!(schema.field(2).data_type(), &DataType::Float64);
        assert_eq!(schema.field(3).data_type(), &DataType::Boolean);
        assert_eq!(schema.field(4).data_type(), &DataType::Utf8);
        assert_eq!(batch.column(1).null_count(), 1);
    }

    #[test]
    fn test_headers_are_normalized() {
        let batch = range_to_batch(&range(vec![
            vec![s("week"), Data::Empty, s("week")],
            vec![Data::Int(1), Data::Int(2), Data::Int(3)],
        ]))
        .unwrap();
        let names: Vec<_> = batch.schema().fields().iter().map(|f| f.name().clone()).collect();
        assert_eq!(names, vec!["week", "Unnamed: 1", "week.1"]);
    }

    #[test]
    fn test_corrupt_workbook_is_reported() {
        let err = parse_spreadsheet(b"definitely not a workbook", "predictions.xlsx").unwrap_err();
        assert!(err.to_string().contains("predictions.xlsx"));
    }
}
