use std::path::Path;

use csv::{ReaderBuilder, Trim, WriterBuilder};
use encoding_rs::BIG5;
use tracing::debug;

use crate::error::ExtractError;
use crate::model::TableRow;
use crate::normalize::normalize_amount;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decodes spreadsheet exports, which arrive as UTF-8 or, from older
/// Traditional Chinese tools, Big5.
fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }

    let (big5, _, had_errors) = BIG5.decode(bytes);
    if !had_errors {
        return big5.into_owned();
    }

    String::from_utf8_lossy(bytes).to_string()
}

/// Tab when the header line contains one, comma otherwise.
#[must_use]
pub fn detect_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    if header.contains('\t') { b'\t' } else { b',' }
}

/// Parses a delimited table with a header line into rows.
///
/// Columns map by position to policy year, insured age, cash value and death
/// benefit; missing columns stay empty. Records with fewer than two non-empty
/// cells are skipped.
pub fn parse_delimited(bytes: &[u8], delimiter: Option<u8>) -> Result<Vec<TableRow>, ExtractError> {
    let text = decode_text(bytes);
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&text));
    if !matches!(delimiter, b',' | b'\t' | b';') {
        return Err(ExtractError::InvalidOption(format!(
            "unsupported delimiter '{}'",
            char::from(delimiter)
        )));
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let populated = record.iter().filter(|cell| !cell.is_empty()).count();
        if populated < 2 {
            debug!(line = index + 2, "skipping record with fewer than two cells");
            continue;
        }

        let cell = |position: usize| record.get(position).unwrap_or_default().to_string();
        rows.push(TableRow {
            policy_year: cell(0),
            insurance_age: cell(1),
            cash_value: normalize_amount(&cell(2)),
            death_benefit: normalize_amount(&cell(3)),
        });
    }

    Ok(rows)
}

pub fn write_rows_csv(path: &Path, rows: &[TableRow], delimiter: u8) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    writer.write_record(TableRow::CSV_HEADERS)?;
    for row in rows {
        writer.write_record(row.to_record())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn rows_to_csv_string(rows: &[TableRow], delimiter: u8) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    writer.write_record(TableRow::CSV_HEADERS)?;
    for row in rows {
        writer.write_record(row.to_record())?;
    }
    writer.flush()?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}
