//! Stage driver for the drug-safety signal pipeline.

pub mod context;
pub mod error;
pub mod pipeline;
pub mod run_log;
pub mod stages;

pub use context::PipelineContext;
pub use error::{PipelineError, StageError};
pub use pipeline::{
    Artifact, Pipeline, PipelineRun, PipelineState, Stage, StageFailure,
    build_default_pipeline, build_resolution_pipeline,
};
pub use run_log::{LogKind, RunLog, RunLogEntry};
pub use stages::{
    ConsolidateStage, ContingencyStage, CurationQueueStage, FinalizeStage, ManualOverrideStage,
    NormalizeStage, ResumeStage, RuleStage, StatisticsStage,
};
