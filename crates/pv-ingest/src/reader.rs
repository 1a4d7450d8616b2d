//! Delimited-file reader setup shared by the cohort readers.

use std::fs::File;
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};

/// Field delimiter of the FAERS quarterly ASCII files.
pub const FAERS_DELIMITER: u8 = b'$';

/// Options for reading cohort files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOptions {
    pub delimiter: u8,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl IngestOptions {
    pub fn faers() -> Self {
        Self {
            delimiter: FAERS_DELIMITER,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// Rows read from a cohort file plus the data-quality counters.
#[derive(Debug, Clone)]
pub struct Ingested<T> {
    pub records: Vec<T>,
    /// Rows dropped because a required value was blank or duplicated.
    pub skipped: usize,
    /// Rows kept after filling in a missing or unparsable value.
    pub repaired: usize,
}

impl<T> Ingested<T> {
    pub(crate) fn new() -> Self {
        Self {
            records: Vec::new(),
            skipped: 0,
            repaired: 0,
        }
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim()
        .trim_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Open `path` with lowercase, trimmed headers so serde aliases match
/// regardless of header casing. `$`-delimited files are read without quote
/// handling.
pub(crate) fn open(path: &Path, options: IngestOptions) -> Result<Reader<File>> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .quoting(options.delimiter != FAERS_DELIMITER)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file);
    let headers: StringRecord = reader
        .headers()
        .map_err(|err| IngestError::csv(path, &err))?
        .iter()
        .map(normalize_header)
        .collect();
    reader.set_headers(headers);
    Ok(reader)
}

/// First non-blank value of `candidates`. FAERS files carry both `primaryid`
/// (report version) and `caseid`; the explicit `case_id` column wins, then
/// `primaryid`.
pub(crate) fn first_non_blank(candidates: [String; 3]) -> String {
    candidates
        .into_iter()
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

/// Fails unless one of `aliases` is a header of `reader`.
pub(crate) fn require_any(
    path: &Path,
    reader: &mut Reader<File>,
    aliases: &[&str],
) -> Result<()> {
    let headers = reader
        .headers()
        .map_err(|err| IngestError::csv(path, &err))?;
    if headers.iter().any(|header| aliases.contains(&header)) {
        return Ok(());
    }
    Err(IngestError::MissingColumn {
        path: path.to_path_buf(),
        column: aliases.first().copied().unwrap_or_default().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_lowercased_and_joined() {
        assert_eq!(normalize_header("\u{feff}PrimaryID "), "primaryid");
        assert_eq!(normalize_header("Raw  Drug Name"), "raw_drug_name");
    }
}
