//! Structured run log.
//!
//! Every stage outcome is recorded as an ordered `(stage, kind, message,
//! rows, timestamp)` entry and mirrored to `tracing`. The log is written
//! as `run_log.json` next to the output tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogKind {
    Skipped,
    RowsAffected,
    Warning,
    Error,
    Info,
}

impl LogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::RowsAffected => "rows-affected",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub stage: String,
    pub kind: LogKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLog {
    entries: Vec<RunLogEntry>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, stage: &str, kind: LogKind, message: String, rows: Option<usize>) {
        self.entries.push(RunLogEntry {
            stage: stage.to_string(),
            kind,
            message,
            rows,
            timestamp: Utc::now(),
        });
    }

    pub fn skipped(&mut self, stage: &str, message: impl Into<String>) {
        let message = message.into();
        warn!(stage, reason = %message, "stage skipped");
        self.push(stage, LogKind::Skipped, message, None);
    }

    pub fn rows_affected(&mut self, stage: &str, rows: usize) {
        info!(stage, rows, "stage completed");
        self.push(stage, LogKind::RowsAffected, "completed".to_string(), Some(rows));
    }

    pub fn warning(&mut self, stage: &str, message: impl Into<String>) {
        let message = message.into();
        warn!(stage, %message, "data quality");
        self.push(stage, LogKind::Warning, message, None);
    }

    pub fn error(&mut self, stage: &str, message: impl Into<String>) {
        let message = message.into();
        error!(stage, %message, "stage failed");
        self.push(stage, LogKind::Error, message, None);
    }

    pub fn info(&mut self, stage: &str, message: impl Into<String>) {
        let message = message.into();
        info!(stage, %message);
        self.push(stage, LogKind::Info, message, None);
    }

    pub fn entries(&self) -> &[RunLogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows affected by `stage`, if it completed.
    pub fn rows_for(&self, stage: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.stage == stage && entry.kind == LogKind::RowsAffected)
            .and_then(|entry| entry.rows)
    }

    pub fn kind_of(&self, stage: &str) -> Option<LogKind> {
        self.entries
            .iter()
            .rev()
            .find(|entry| {
                entry.stage == stage
                    && matches!(
                        entry.kind,
                        LogKind::Skipped | LogKind::RowsAffected | LogKind::Error
                    )
            })
            .map(|entry| entry.kind)
    }

    pub fn errors(&self) -> impl Iterator<Item = &RunLogEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.kind == LogKind::Error)
    }
}
