//! Shared CSV utilities for loading reference files.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::error::TerminologyError;

pub type Row = BTreeMap<String, String>;

/// Read a headered CSV file into a vector of row maps.
///
/// Header names are lowercased with BOM characters removed; values are trimmed.
pub fn read_csv_rows(path: &Path) -> Result<Vec<Row>, TerminologyError> {
    let file = File::open(path).map_err(|err| TerminologyError::io(path, err))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| TerminologyError::csv(path, &err))?
        .iter()
        .map(|header| header.trim_matches('\u{feff}').trim().to_lowercase())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| TerminologyError::csv(path, &err))?;
        let mut row = Row::new();
        for (idx, value) in record.iter().enumerate() {
            let Some(key) = headers.get(idx) else {
                continue;
            };
            row.insert(key.clone(), value.trim().to_string());
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Read a pipe-delimited, header-less RRF file into raw records.
pub fn read_rrf_records(path: &Path) -> Result<Vec<StringRecord>, TerminologyError> {
    let file = File::open(path).map_err(|err| TerminologyError::io(path, err))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'|')
        .quoting(false)
        .flexible(true)
        .from_reader(file);
    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record.map_err(|err| TerminologyError::csv(path, &err))?);
    }
    Ok(records)
}

/// Fails unless every column in `columns` is present in the first row.
pub fn require_columns(path: &Path, rows: &[Row], columns: &[&str]) -> Result<(), TerminologyError> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    for column in columns {
        if !first.contains_key(*column) {
            return Err(TerminologyError::MissingColumn {
                path: path.to_path_buf(),
                column: (*column).to_string(),
            });
        }
    }
    Ok(())
}

/// Get a field value from a row, returning empty string if not present.
pub fn get_field(row: &Row, key: &str) -> String {
    row.get(key).cloned().unwrap_or_default()
}

/// Get an optional field value from a row (None if empty or missing).
pub fn get_optional(row: &Row, key: &str) -> Option<String> {
    row.get(key).filter(|v| !v.is_empty()).cloned()
}

/// Field `idx` of an RRF record, trimmed; empty when absent.
pub fn rrf_field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).map(str::trim).unwrap_or("")
}

/// True when `path` has an `.rrf` extension (case-insensitive).
pub fn is_rrf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("rrf"))
}
