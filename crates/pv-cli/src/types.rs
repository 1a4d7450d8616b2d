use std::collections::BTreeMap;
use std::path::PathBuf;

use pv_core::{LogKind, RunLog};
use pv_model::{ProvenanceCode, SignalScore};

#[derive(Debug)]
pub struct RunResult {
    pub output_dir: PathBuf,
    pub written: Vec<PathBuf>,
    pub stages: Vec<StageSummary>,
    pub records: usize,
    pub resolved: usize,
    pub provenance: BTreeMap<ProvenanceCode, usize>,
    pub curation_queue: Option<usize>,
    pub cells: Option<usize>,
    pub scores: Option<usize>,
    pub top_signals: Vec<SignalScore>,
    /// `stage: error` of the stage that halted the run.
    pub failure: Option<String>,
    pub has_errors: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Completed,
    Warning,
    Skipped,
    Failed,
    NotRun,
}

impl StageStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Completed => "ok",
            Self::Warning => "warning",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
            Self::NotRun => "not run",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSummary {
    pub name: &'static str,
    pub status: StageStatus,
    pub rows: Option<usize>,
    pub message: Option<String>,
}

impl StageSummary {
    /// Status from the last outcome entry the stage wrote to the run log.
    pub fn from_log(name: &'static str, log: &RunLog) -> Self {
        let mut entries = log.entries().iter().rev().filter(|entry| entry.stage == name);
        let outcome = entries
            .clone()
            .find(|entry| entry.kind != LogKind::Info)
            .or_else(|| entries.next());
        let Some(entry) = outcome else {
            return Self {
                name,
                status: StageStatus::NotRun,
                rows: None,
                message: None,
            };
        };
        let status = match entry.kind {
            LogKind::RowsAffected | LogKind::Info => StageStatus::Completed,
            LogKind::Warning => StageStatus::Warning,
            LogKind::Skipped => StageStatus::Skipped,
            LogKind::Error => StageStatus::Failed,
        };
        let message = match entry.kind {
            LogKind::RowsAffected => None,
            _ => Some(entry.message.clone()),
        };
        Self {
            name,
            status,
            rows: entry.rows,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_outcome_wins_over_info() {
        let mut log = RunLog::new();
        log.info("normalize", "2 blank drug names");
        log.rows_affected("normalize", 6);
        log.skipped("cross-reference", "cross-reference table not available");
        log.warning("contingency", "3 blank event terms");
        log.info("curation-queue", "queue empty");

        let normalize = StageSummary::from_log("normalize", &log);
        assert_eq!(normalize.status, StageStatus::Completed);
        assert_eq!(normalize.rows, Some(6));
        assert!(normalize.message.is_none());

        let xref = StageSummary::from_log("cross-reference", &log);
        assert_eq!(xref.status, StageStatus::Skipped);
        assert_eq!(
            xref.message.as_deref(),
            Some("cross-reference table not available")
        );

        assert_eq!(
            StageSummary::from_log("contingency", &log).status,
            StageStatus::Warning
        );
        assert_eq!(
            StageSummary::from_log("curation-queue", &log).status,
            StageStatus::Completed
        );
        assert_eq!(
            StageSummary::from_log("statistics", &log).status,
            StageStatus::NotRun
        );
    }
}
