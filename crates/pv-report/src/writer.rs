//! Output directory writers.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use polars::prelude::{CsvWriter, DataFrame, PolarsResult, SerWriter};
use serde::Serialize;
use tracing::{debug, info};

use pv_core::{PipelineRun, PipelineState, RunLog, RunLogEntry};
use pv_model::{ContingencyCell, CurationQueueEntry, ResolvedDrugMapping, SignalScore};

use crate::frames::{contingency_frame, curation_queue_frame, mapping_frame, score_frame};

pub const MAPPING_FILE: &str = "resolved_drug_mapping.csv";
pub const CURATION_QUEUE_FILE: &str = "curation_queue.csv";
pub const CONTINGENCY_FILE: &str = "contingency.csv";
pub const SIGNAL_SCORES_FILE: &str = "signal_scores.csv";
pub const RUN_LOG_FILE: &str = "run_log.json";

/// Tables to write. `None` means the producing stage did not run; any file
/// left from an earlier run is removed, unless the run halted.
#[derive(Debug, Clone, Copy)]
pub struct ReportOutputs<'a> {
    pub mappings: Option<&'a [ResolvedDrugMapping]>,
    pub curation_queue: Option<&'a [CurationQueueEntry]>,
    pub cells: Option<&'a [ContingencyCell]>,
    pub scores: Option<&'a [SignalScore]>,
    pub log: &'a RunLog,
    pub failed_stage: Option<&'a str>,
}

impl<'a> ReportOutputs<'a> {
    pub fn from_state(state: &'a PipelineState<'_>) -> Self {
        Self {
            mappings: state.mappings.as_deref(),
            curation_queue: state.curation_queue.as_deref(),
            cells: state.cells.as_deref(),
            scores: state.scores.as_deref(),
            log: &state.log,
            failed_stage: None,
        }
    }

    /// Like [`ReportOutputs::from_state`], falling back to the working-table
    /// snapshot for the mapping file when the run halted before `finalize`.
    pub fn from_run(run: &'a PipelineRun<'_>) -> Self {
        Self {
            mappings: run.mappings(),
            failed_stage: run.failure.as_ref().map(|failure| failure.stage),
            ..Self::from_state(&run.state)
        }
    }
}

/// Files written by [`write_outputs`], in write order.
#[derive(Debug, Clone, Default)]
pub struct WrittenFiles {
    pub paths: Vec<PathBuf>,
}

/// Serialized form of `run_log.json`.
#[derive(Debug, Serialize)]
pub struct RunLogPayload<'a> {
    pub generated_at: DateTime<Utc>,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<&'a str>,
    pub entries: &'a [RunLogEntry],
}

/// Write `df` as a headered CSV file.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("write {}", path.display()))?;
    debug!(path = %path.display(), rows = df.height(), "wrote csv");
    Ok(())
}

pub fn write_run_log(path: &Path, log: &RunLog, failed_stage: Option<&str>) -> Result<()> {
    let payload = RunLogPayload {
        generated_at: Utc::now(),
        complete: failed_stage.is_none(),
        failed_stage,
        entries: log.entries(),
    };
    let json = serde_json::to_string_pretty(&payload).context("serialize run log")?;
    fs::write(path, format!("{json}\n")).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn write_table<T>(
    dir: &Path,
    name: &str,
    rows: Option<&[T]>,
    frame: impl Fn(&[T]) -> PolarsResult<DataFrame>,
    halted: bool,
    written: &mut WrittenFiles,
) -> Result<()> {
    let path = dir.join(name);
    let Some(rows) = rows else {
        if halted {
            debug!(path = %path.display(), "halted run, existing output kept");
        } else if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("remove stale {}", path.display()))?;
            debug!(path = %path.display(), "removed stale output");
        }
        return Ok(());
    };
    let mut df = frame(rows).with_context(|| format!("build {name} frame"))?;
    write_csv(&mut df, &path)?;
    written.paths.push(path);
    Ok(())
}

/// Write every available table and the run log into `dir`.
pub fn write_outputs(dir: &Path, outputs: &ReportOutputs<'_>) -> Result<WrittenFiles> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let halted = outputs.failed_stage.is_some();
    let mut written = WrittenFiles::default();
    write_table(
        dir,
        MAPPING_FILE,
        outputs.mappings,
        mapping_frame,
        halted,
        &mut written,
    )?;
    write_table(
        dir,
        CURATION_QUEUE_FILE,
        outputs.curation_queue,
        curation_queue_frame,
        halted,
        &mut written,
    )?;
    write_table(
        dir,
        CONTINGENCY_FILE,
        outputs.cells,
        contingency_frame,
        halted,
        &mut written,
    )?;
    write_table(
        dir,
        SIGNAL_SCORES_FILE,
        outputs.scores,
        score_frame,
        halted,
        &mut written,
    )?;

    let log_path = dir.join(RUN_LOG_FILE);
    write_run_log(&log_path, outputs.log, outputs.failed_stage)?;
    written.paths.push(log_path);

    info!(dir = %dir.display(), files = written.paths.len(), "outputs written");
    Ok(written)
}
