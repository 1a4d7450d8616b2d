use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path} at line {line}: {message}")]
    Csv {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("missing required column {column} in {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("invalid value in {path} at line {line}: {message}")]
    InvalidValue {
        path: PathBuf,
        line: u64,
        message: String,
    },
}

impl IngestError {
    pub(crate) fn csv(path: impl Into<PathBuf>, source: &csv::Error) -> Self {
        let line = source.position().map_or(0, csv::Position::line);
        Self::Csv {
            path: path.into(),
            line,
            message: source.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
