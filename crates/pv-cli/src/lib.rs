//! Library side of the `pv-pipeline` binary.

pub mod config;
pub mod inputs;
pub mod logging;
