//! Structured and line-split parsing of delimited text

use arrow::record_batch::RecordBatch;
use csv::ReaderBuilder;

use crate::config::NullConfig;
use crate::schema::{normalize_headers, raw_string_batch, SchemaDetector};
use crate::DataError;

use super::delimiter::infer_delimiter;
use super::encoding::{TextEncoding, PERMISSIVE};

/// Decode `content` strictly and parse it as a typed CSV table.
///
/// Rows shorter than the header get missing trailing cells; a row with more
/// fields than the header is an error. Whitespace-only lines are skipped.
/// Returns the batch and the delimiter actually used.
pub fn parse_structured(
    content: &[u8],
    encoding: TextEncoding,
    delimiter: Option<u8>,
    nulls: &NullConfig,
) -> Result<(RecordBatch, u8), DataError> {
    let text = encoding
        .decode_strict(content)
        .ok_or_else(|| DataError::Csv(format!("content is not valid {}", encoding.name())))?;
    let text = strip_bom(&text);
    let delimiter = delimiter.unwrap_or_else(|| infer_delimiter(text));

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let raw_headers = reader.headers()?.clone();
    if raw_headers.is_empty() {
        return Err(DataError::Csv("no header row".to_string()));
    }
    let headers = normalize_headers(raw_headers.iter());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.len() > headers.len() {
            let line = record.position().map_or(0, |p| p.line());
            return Err(DataError::Csv(format!(
                "line {} has {} fields, expected at most {}",
                line,
                record.len(),
                headers.len()
            )));
        }
        if record.len() == 1 && record[0].trim().is_empty() {
            continue;
        }
        rows.push(record.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    }

    let batch = SchemaDetector::new(nulls).typed_batch(&headers, &rows)?;
    Ok((batch, delimiter))
}

/// Split decoded lines by hand when the structured parse fails.
///
/// Each line is split on `;` if it contains one, otherwise on `,`. Blank
/// lines are skipped and every cell stays a raw string. Returns `None` when
/// there is no header line.
pub fn parse_line_split(content: &[u8], encoding: TextEncoding) -> Option<RecordBatch> {
    let text = encoding
        .decode_strict(content)
        .unwrap_or_else(|| PERMISSIVE.decode_strict(content).unwrap_or_default());
    let text = strip_bom(&text).trim();
    if text.is_empty() {
        return None;
    }

    let mut lines = text.split('\n').map(|line| line.trim_end_matches('\r'));
    let headers = normalize_headers(split_line(lines.next()?));
    let width = headers.len();

    let rows = lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut row = split_line(line);
            row.resize(width, String::new());
            row
        })
        .collect::<Vec<_>>();

    raw_string_batch(&headers, &rows).ok()
}

fn split_line(line: &str) -> Vec<String> {
    let separator = if line.contains(';') { ';' } else { ',' };
    line.split(separator).map(|s| s.to_string()).collect()
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::AsArray;
    use arrow::datatypes::{DataType, Int64Type};

    #[test]
    fn test_structured_semicolon() {
        let nulls = NullConfig::default();
        let (batch, delimiter) =
            parse_structured(b"id;waarde\n1;10\n2;20\n", TextEncoding::Utf8, Some(b';'), &nulls).unwrap();

        assert_eq!(delimiter, b';');
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(1).name(), "waarde");
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Int64);
        assert_eq!(batch.column(1).as_primitive::<Int64Type>().value(1), 20);
    }

    #[test]
    fn test_structured_quotes_and_bom() {
        let nulls = NullConfig::default();
        let content = "\u{feff}naam,omschrijving\nA,\"Zorg, welzijn\"\n".as_bytes();
        let (batch, _) = parse_structured(content, TextEncoding::Utf8, Some(b','), &nulls).unwrap();

        assert_eq!(batch.schema().field(0).name(), "naam");
        assert_eq!(batch.column(1).as_string::<i32>().value(0), "Zorg, welzijn");
    }

    #[test]
    fn test_structured_infers_tab() {
        let nulls = NullConfig::default();
        let (batch, delimiter) = parse_structured(b"a\tb\n1\t2\n", TextEncoding::Utf8, None, &nulls).unwrap();
        assert_eq!(delimiter, b'\t');
        assert_eq!(batch.num_columns(), 2);
    }

    #[test]
    fn test_structured_rejects_ragged_rows() {
        let nulls = NullConfig::default();
        assert!(parse_structured(b"a;b\n1;2;3\n", TextEncoding::Utf8, Some(b';'), &nulls).is_err());
    }

    #[test]
    fn test_structured_pads_short_rows() {
        let nulls = NullConfig::default();
        let (batch, _) = parse_structured(b"a;b\n1;2\n3\n", TextEncoding::Utf8, Some(b';'), &nulls).unwrap();

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Int64);
        assert_eq!(batch.column(1).null_count(), 1);
        assert_eq!(batch.column(0).as_primitive::<Int64Type>().value(1), 3);
    }

    #[test]
    fn test_structured_skips_whitespace_lines() {
        let nulls = NullConfig::default();
        let (batch, _) =
            parse_structured(b"a;b\n1;2\n   \n3;4\n \t \n", TextEncoding::Utf8, Some(b';'), &nulls).unwrap();

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Int64);
        assert_eq!(batch.column(0).null_count(), 0);
    }

    #[test]
    fn test_structured_rejects_bad_encoding() {
        let nulls = NullConfig::default();
        let result = parse_structured(b"a;b\n\xff;1\n", TextEncoding::Utf8, Some(b';'), &nulls);
        assert!(matches!(result, Err(DataError::Csv(_))));
    }

    #[test]
    fn test_line_split() {
        let batch = parse_line_split(b"a;b\r\n1;2;3\n\n4\n", TextEncoding::Utf8).unwrap();
        assert_eq!(batch.num_columns(), 2);
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.column(0).as_string::<i32>().value(1), "4");
        assert_eq!(batch.column(1).as_string::<i32>().value(0), "2");
        assert_eq!(batch.column(1).as_string::<i32>().value(1), "");
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Utf8);
    }

    #[test]
    fn test_line_split_decodes_permissively() {
        let batch = parse_line_split(b"naam,plaats\nJos\xe9,Ede\n", TextEncoding::Utf8).unwrap();
        assert_eq!(batch.column(0).as_string::<i32>().value(0), "José");
    }

    #[test]
    fn test_line_split_empty() {
        assert!(parse_line_split(b"  \n\n", TextEncoding::Utf8).is_none());
    }
}
