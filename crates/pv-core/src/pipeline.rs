//! Ordered stage execution.
//!
//! Each stage implements [`Stage`] and runs once, in the fixed order of
//! [`build_default_pipeline`]. The driver owns the failure policy:
//!
//! - a stage whose [`Artifact`] requirements are not met is skipped and
//!   logged;
//! - [`StageError::MissingDependency`] also skips;
//! - [`StageError::DataQuality`] is logged as a warning and the run goes on;
//! - [`StageError::Execution`] halts the run, unless the stage is
//!   best-effort, in which case it is logged and swallowed.
//!
//! Artifacts produced before a halt stay in [`PipelineState`], so the caller
//! can still write them. A halt before **finalize** also snapshots the
//! working table as [`PipelineRun::working_mappings`].
//!
//! # Standard Pipeline Order
//!
//! 1. **normalize** - clean strings, build the working table
//! 2. **resume** - seed the table from an earlier mapping file
//! 3. **direct / cross-reference / graph rules** - rules 1 to 6
//! 4. **consolidate** - rule 7
//! 5. **concept-id-fallback** - rule 8
//! 6. **curation-queue** - best-effort
//! 7. **manual-override**
//! 8. **finalize** - dedupe, one row per record
//! 9. **contingency**, **statistics**
//!
//! # Example
//!
//! ```ignore
//! use pv_core::{PipelineContext, build_default_pipeline};
//!
//! let ctx = PipelineContext::new(&index, &records, &options)?.with_events(&events);
//! let run = build_default_pipeline().run(&ctx);
//! ```

use std::fmt;

use tracing::info_span;

use pv_model::{ContingencyCell, CurationQueueEntry, ResolvedDrugMapping, SignalScore};
use pv_resolve::{ConsolidationSummary, ResolutionEngine, ResolutionTable};
use pv_signal::CooccurrenceCounts;

use crate::context::PipelineContext;
use crate::error::{PipelineError, StageError};
use crate::run_log::RunLog;
use crate::stages::{
    ConsolidateStage, ContingencyStage, CurationQueueStage, FinalizeStage, ManualOverrideStage,
    NormalizeStage, ResumeStage, RuleStage, StatisticsStage,
};

/// Inputs and intermediate tables a stage can depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    CrossReference,
    ManualOverrides,
    SavedMappings,
    Events,
    ResolutionTable,
    Mappings,
    Contingency,
}

impl Artifact {
    pub fn label(self) -> &'static str {
        match self {
            Self::CrossReference => "cross-reference table",
            Self::ManualOverrides => "manual overrides",
            Self::SavedMappings => "saved mapping table",
            Self::Events => "event records",
            Self::ResolutionTable => "resolution table",
            Self::Mappings => "resolved drug mappings",
            Self::Contingency => "contingency table",
        }
    }

    /// Present and non-empty.
    pub fn is_available(self, ctx: &PipelineContext<'_>, state: &PipelineState<'_>) -> bool {
        match self {
            Self::CrossReference => ctx.xref.is_some_and(|xref| !xref.is_empty()),
            Self::ManualOverrides => !ctx.overrides.is_empty(),
            Self::SavedMappings => !ctx.saved_mappings.is_empty(),
            Self::Events => !ctx.events.is_empty(),
            Self::ResolutionTable => state
                .table
                .as_ref()
                .is_some_and(|table| !table.is_empty()),
            Self::Mappings => state.mappings.as_ref().is_some_and(|rows| !rows.is_empty()),
            Self::Contingency => state.cells.as_ref().is_some_and(|cells| !cells.is_empty()),
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single stage of the pipeline.
pub trait Stage: Send + Sync {
    /// Stage name used in logs and the run log.
    fn name(&self) -> &'static str;

    /// Artifacts that must be present for the stage to run.
    fn requires(&self) -> &'static [Artifact] {
        &[]
    }

    /// Whether an execution error is logged and swallowed instead of halting.
    fn best_effort(&self) -> bool {
        false
    }

    /// Run the stage. Returns the number of rows affected.
    fn run<'a>(
        &self,
        ctx: &PipelineContext<'a>,
        state: &mut PipelineState<'a>,
    ) -> Result<usize, StageError>;
}

/// Artifacts produced so far, plus the run log.
#[derive(Default)]
pub struct PipelineState<'a> {
    pub engine: Option<ResolutionEngine<'a>>,
    pub table: Option<ResolutionTable>,
    pub consolidation: Option<ConsolidationSummary>,
    pub curation_queue: Option<Vec<CurationQueueEntry>>,
    pub mappings: Option<Vec<ResolvedDrugMapping>>,
    pub cooccurrence: Option<CooccurrenceCounts>,
    pub cells: Option<Vec<ContingencyCell>>,
    pub scores: Option<Vec<SignalScore>>,
    pub log: RunLog,
    /// Stages that completed, in order.
    pub completed: Vec<&'static str>,
}

impl<'a> PipelineState<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine and working table, or a missing-dependency error.
    pub fn resolution(
        &mut self,
    ) -> Result<(&ResolutionEngine<'a>, &mut ResolutionTable), StageError> {
        match (&self.engine, &mut self.table) {
            (Some(engine), Some(table)) => Ok((engine, table)),
            _ => Err(StageError::missing(Artifact::ResolutionTable.label())),
        }
    }

    /// Best row per record of the working table, without deduplicating it.
    pub fn working_mappings(&self) -> Option<Vec<ResolvedDrugMapping>> {
        match (&self.engine, &self.table) {
            (Some(engine), Some(table)) => Some(engine.finalize(table)),
            _ => None,
        }
    }
}

/// Stage that halted the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: &'static str,
    pub error: StageError,
}

/// Final state of a run and the stage that halted it, if any.
pub struct PipelineRun<'a> {
    pub state: PipelineState<'a>,
    pub failure: Option<StageFailure>,
    /// Working-table snapshot taken when the run halted before `finalize`.
    pub working_mappings: Option<Vec<ResolvedDrugMapping>>,
}

impl<'a> PipelineRun<'a> {
    fn halted(state: PipelineState<'a>, failure: StageFailure) -> Self {
        let working_mappings = match state.mappings {
            Some(_) => None,
            None => state.working_mappings(),
        };
        Self {
            state,
            failure: Some(failure),
            working_mappings,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Final mappings, or the working-table snapshot of a halted run.
    pub fn mappings(&self) -> Option<&[ResolvedDrugMapping]> {
        self.state
            .mappings
            .as_deref()
            .or(self.working_mappings.as_deref())
    }

    pub fn error(&self) -> Option<PipelineError> {
        self.failure.as_ref().map(|failure| PipelineError::StageFailed {
            stage: failure.stage.to_string(),
            source: failure.error.clone(),
        })
    }
}

/// An ordered list of stages.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stage to the end of the pipeline.
    pub fn add_stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Insert a stage at a specific position.
    pub fn insert_stage(mut self, index: usize, stage: Box<dyn Stage>) -> Self {
        self.stages.insert(index.min(self.stages.len()), stage);
        self
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn run<'a>(&self, ctx: &PipelineContext<'a>) -> PipelineRun<'a> {
        self.run_with_state(ctx, PipelineState::new())
    }

    /// Run every stage on an existing state.
    pub fn run_with_state<'a>(
        &self,
        ctx: &PipelineContext<'a>,
        mut state: PipelineState<'a>,
    ) -> PipelineRun<'a> {
        let run_span = info_span!(
            "pipeline",
            records = ctx.records.len(),
            stages = self.stages.len()
        );
        let _run_guard = run_span.enter();

        for stage in &self.stages {
            let name = stage.name();
            let stage_span = info_span!("stage", stage = name);
            let _stage_guard = stage_span.enter();

            if let Some(missing) = stage
                .requires()
                .iter()
                .find(|artifact| !artifact.is_available(ctx, &state))
            {
                state.log.skipped(name, format!("{missing} not available"));
                continue;
            }

            match stage.run(ctx, &mut state) {
                Ok(rows) => {
                    state.log.rows_affected(name, rows);
                    state.completed.push(name);
                }
                Err(StageError::MissingDependency(what)) => {
                    state.log.skipped(name, what);
                }
                Err(StageError::DataQuality(message)) => {
                    state.log.warning(name, message);
                    state.completed.push(name);
                }
                Err(error) if stage.best_effort() => {
                    state.log.error(name, format!("{error} (best-effort, continuing)"));
                }
                Err(error) => {
                    state.log.error(name, error.to_string());
                    return PipelineRun::halted(state, StageFailure { stage: name, error });
                }
            }
        }
        PipelineRun {
            state,
            failure: None,
            working_mappings: None,
        }
    }
}

fn add_resolution_stages(mut pipeline: Pipeline) -> Pipeline {
    pipeline = pipeline
        .add_stage(Box::new(NormalizeStage))
        .add_stage(Box::new(ResumeStage));
    for rule in pv_resolve::primary_rules() {
        pipeline = pipeline.add_stage(Box::new(RuleStage::new(rule)));
    }
    pipeline = pipeline.add_stage(Box::new(ConsolidateStage));
    for rule in pv_resolve::fallback_rules() {
        pipeline = pipeline.add_stage(Box::new(RuleStage::new(rule)));
    }
    pipeline
        .add_stage(Box::new(CurationQueueStage))
        .add_stage(Box::new(ManualOverrideStage))
        .add_stage(Box::new(FinalizeStage))
}

/// Resolution stages only.
pub fn build_resolution_pipeline() -> Pipeline {
    add_resolution_stages(Pipeline::new())
}

/// Resolution followed by signal detection.
pub fn build_default_pipeline() -> Pipeline {
    add_resolution_stages(Pipeline::new())
        .add_stage(Box::new(ContingencyStage))
        .add_stage(Box::new(StatisticsStage))
}
