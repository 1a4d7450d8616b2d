//! Stage and pipeline errors.

use thiserror::Error;

/// Outcome of a stage that did not complete normally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    /// A required upstream artifact is absent or empty; the stage is skipped.
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    /// Bad input rows that were guarded locally; the run continues.
    #[error("data quality: {0}")]
    DataQuality(String),

    /// The stage failed; the run halts unless the stage is best-effort.
    #[error("stage execution failed: {0}")]
    Execution(String),
}

impl StageError {
    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingDependency(what.into())
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }
}

/// Errors that stop the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("terminology graph is missing or empty")]
    MissingTerminology,

    #[error("no drug records to resolve")]
    MissingDrugRecords,

    #[error("stage '{stage}' failed: {source}")]
    StageFailed {
        stage: String,
        #[source]
        source: StageError,
    },
}
