//! Loads every input file of a run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use pv_core::PipelineContext;
use pv_ingest::{IngestOptions, read_drug_records, read_event_records, read_resolved_mappings};
use pv_model::{
    CrossReferenceIndex, EventRecord, ManualOverrideEntry, PipelineOptions, RawDrugRecord,
    ResolvedDrugMapping, TerminologyIndex,
};
use pv_terminology::{load_cross_reference_index, load_manual_overrides, load_terminology};

/// Paths of the input files. Only the drug file and the concept file are
/// required.
#[derive(Debug, Clone, Default)]
pub struct InputPaths {
    pub drugs: PathBuf,
    pub concepts: PathBuf,
    pub relations: Option<PathBuf>,
    pub events: Option<PathBuf>,
    pub xref: Option<PathBuf>,
    pub overrides: Option<PathBuf>,
    /// Mapping table of an earlier run.
    pub resume: Option<PathBuf>,
}

/// Everything a [`PipelineContext`] borrows.
#[derive(Debug)]
pub struct PipelineInputs {
    pub index: TerminologyIndex,
    pub xref: Option<CrossReferenceIndex>,
    pub records: Vec<RawDrugRecord>,
    pub events: Vec<EventRecord>,
    pub overrides: Vec<ManualOverrideEntry>,
    pub saved_mappings: Vec<ResolvedDrugMapping>,
}

impl PipelineInputs {
    pub fn load(paths: &InputPaths, ingest: IngestOptions) -> Result<Self> {
        let span = info_span!("load_inputs", drugs = %paths.drugs.display());
        let _guard = span.enter();

        let index = load_terminology(&paths.concepts, paths.relations.as_deref())?;
        let xref = paths
            .xref
            .as_deref()
            .map(load_cross_reference_index)
            .transpose()?;

        let drugs = read_drug_records(&paths.drugs, ingest)
            .with_context(|| format!("read drug records: {}", paths.drugs.display()))?;
        report_ingest("drug records", &paths.drugs, drugs.skipped, drugs.repaired);

        let events = match paths.events.as_deref() {
            Some(path) => {
                let events = read_event_records(path, ingest)
                    .with_context(|| format!("read event records: {}", path.display()))?;
                report_ingest("event records", path, events.skipped, events.repaired);
                events.records
            }
            None => Vec::new(),
        };

        let overrides = match paths.overrides.as_deref() {
            Some(path) => load_manual_overrides(path)
                .with_context(|| format!("load manual overrides: {}", path.display()))?
                .items,
            None => Vec::new(),
        };

        let saved_mappings = match paths.resume.as_deref() {
            Some(path) => read_resolved_mappings(path)
                .with_context(|| format!("read saved mappings: {}", path.display()))?,
            None => Vec::new(),
        };

        info!(
            records = drugs.records.len(),
            events = events.len(),
            overrides = overrides.len(),
            saved_mappings = saved_mappings.len(),
            "inputs loaded"
        );
        Ok(Self {
            index,
            xref,
            records: drugs.records,
            events,
            overrides,
            saved_mappings,
        })
    }

    /// Context over the loaded inputs. Fails on an empty graph or cohort.
    pub fn context<'a>(&'a self, options: &'a PipelineOptions) -> Result<PipelineContext<'a>> {
        let ctx = PipelineContext::new(&self.index, &self.records, options)?
            .with_xref(self.xref.as_ref())
            .with_events(&self.events)
            .with_overrides(&self.overrides)
            .with_saved_mappings(&self.saved_mappings);
        Ok(ctx)
    }
}

fn report_ingest(what: &str, path: &Path, skipped: usize, repaired: usize) {
    if skipped > 0 || repaired > 0 {
        warn!(path = %path.display(), skipped, repaired, "{what}: rows skipped or repaired");
    }
}
