//! Read-only inputs of one pipeline run.
//!
//! The terminology graph and the drug records are required; everything else
//! is optional and the stages that need a missing input are skipped.

use pv_model::{
    CrossReferenceIndex, EventRecord, ManualOverrideEntry, PipelineOptions, RawDrugRecord,
    ResolvedDrugMapping, TerminologyIndex,
};
use pv_resolve::ResolutionContext;

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy)]
pub struct PipelineContext<'a> {
    pub index: &'a TerminologyIndex,
    pub xref: Option<&'a CrossReferenceIndex>,
    pub records: &'a [RawDrugRecord],
    pub events: &'a [EventRecord],
    pub overrides: &'a [ManualOverrideEntry],
    /// Mapping rows of an earlier run, used to seed the working table.
    pub saved_mappings: &'a [ResolvedDrugMapping],
    pub options: &'a PipelineOptions,
}

impl<'a> PipelineContext<'a> {
    /// Fails when the terminology graph or the drug records are empty.
    pub fn new(
        index: &'a TerminologyIndex,
        records: &'a [RawDrugRecord],
        options: &'a PipelineOptions,
    ) -> Result<Self, PipelineError> {
        if index.is_empty() {
            return Err(PipelineError::MissingTerminology);
        }
        if records.is_empty() {
            return Err(PipelineError::MissingDrugRecords);
        }
        Ok(Self {
            index,
            xref: None,
            records,
            events: &[],
            overrides: &[],
            saved_mappings: &[],
            options,
        })
    }

    pub fn with_xref(mut self, xref: Option<&'a CrossReferenceIndex>) -> Self {
        self.xref = xref;
        self
    }

    pub fn with_events(mut self, events: &'a [EventRecord]) -> Self {
        self.events = events;
        self
    }

    pub fn with_overrides(mut self, overrides: &'a [ManualOverrideEntry]) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_saved_mappings(mut self, saved: &'a [ResolvedDrugMapping]) -> Self {
        self.saved_mappings = saved;
        self
    }

    pub fn resolution_context(&self) -> ResolutionContext<'a> {
        ResolutionContext::new(self.index, &self.options.resolution).with_xref(self.xref)
    }
}
