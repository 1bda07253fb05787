//! CSV upload validation
//!
//! Checks the file extension, decodes the bytes as UTF-8, verifies the header
//! row carries every required column and then yields rows lazily.

use std::collections::HashMap;
use std::path::Path;

use ::csv::{ReaderBuilder, StringRecordsIntoIter, Trim};
use thiserror::Error;

/// Accepted tabular file extension (case-insensitive)
pub const CSV_EXTENSION: &str = "csv";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsvError {
    #[error("{0}")]
    Format(String),

    #[error("CSV is missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Malformed CSV at line {line}: {message}")]
    Parse { line: u64, message: String },
}

/// Reject files whose name does not end in `.csv`
pub fn check_extension(filename: &str) -> Result<(), CsvError> {
    let is_csv = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CSV_EXTENSION));

    if is_csv {
        Ok(())
    } else {
        Err(CsvError::Format(format!(
            "File must be a CSV (got '{}')",
            filename
        )))
    }
}

/// One data row keyed by (trimmed) header name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    line: u64,
    fields: HashMap<String, String>,
}

impl Row {
    /// 1-based line number in the source file
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Trimmed value, `None` when the column is absent or blank
    pub fn non_blank(&self, field: &str) -> Option<&str> {
        self.get(field).map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Single-pass iterator over the data rows of an upload
pub struct Rows<'a> {
    headers: Vec<String>,
    records: StringRecordsIntoIter<&'a [u8]>,
}

impl Iterator for Rows<'_> {
    type Item = Result<Row, CsvError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(match record {
            Ok(record) => {
                let line = record.position().map_or(0, |p| p.line());
                let fields = self
                    .headers
                    .iter()
                    .cloned()
                    .zip(record.iter().map(str::to_string))
                    .collect();
                Ok(Row { line, fields })
            },
            Err(e) => Err(CsvError::Parse {
                line: e.position().map_or(0, |p| p.line()),
                message: e.to_string(),
            }),
        })
    }
}

/// Validate `data` against `required` columns and return its rows
pub fn open<'a>(data: &'a [u8], required: &[&str]) -> Result<Rows<'a>, CsvError> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    std::str::from_utf8(data)
        .map_err(|e| CsvError::Format(format!("File is not valid UTF-8 text: {}", e)))?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CsvError::Format(format!("Unreadable CSV header: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    let missing: Vec<String> = required
        .iter()
        .filter(|field| !headers.iter().any(|h| h == *field))
        .map(|field| field.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(CsvError::Schema { missing });
    }

    Ok(Rows {
        headers,
        records: reader.into_records(),
    })
}
