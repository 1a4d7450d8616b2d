//! Output tables (`polars` frames written as CSV) and the JSON run log.

pub mod frames;
pub mod writer;

pub use frames::{contingency_frame, curation_queue_frame, mapping_frame, score_frame};
pub use writer::{
    CONTINGENCY_FILE, CURATION_QUEUE_FILE, MAPPING_FILE, ReportOutputs, RUN_LOG_FILE,
    RunLogPayload, SIGNAL_SCORES_FILE, WrittenFiles, write_csv, write_outputs, write_run_log,
};
