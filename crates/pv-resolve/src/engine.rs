//! Resolution engine: applies the ordered rules to pending records.

use std::collections::HashMap;

use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, info};

use pv_model::{
    CurationQueueEntry, ManualOverrideEntry, ProvenanceCode, RawDrugRecord, RecordId,
    ResolvedDrugMapping,
};

use crate::consolidate::{ConsolidationSummary, consolidate};
use crate::context::ResolutionContext;
use crate::dedupe::{dedupe, finalize};
use crate::manual::{ManualOverrideMerger, curation_queue};
use crate::prepared::PreparedRecord;
use crate::rules::{MatchRule, fallback_rules, primary_rules};
use crate::table::ResolutionTable;

/// Result of a complete resolution pass.
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    /// One row per input record, in record-id order.
    pub mappings: Vec<ResolvedDrugMapping>,
    pub curation_queue: Vec<CurationQueueEntry>,
    /// Records resolved per rule, in application order.
    pub rule_counts: Vec<(&'static str, usize)>,
    pub consolidation: ConsolidationSummary,
    pub overrides_applied: usize,
    pub duplicates_removed: usize,
}

impl ResolutionOutcome {
    pub fn resolved_count(&self) -> usize {
        self.mappings.iter().filter(|row| row.is_resolved()).count()
    }

    pub fn provenance_counts(&self) -> Vec<(ProvenanceCode, usize)> {
        let mut counts: HashMap<ProvenanceCode, usize> = HashMap::new();
        for code in self.mappings.iter().filter_map(|row| row.provenance_code) {
            *counts.entry(code).or_insert(0) += 1;
        }
        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort();
        counts
    }
}

/// Drug-identity resolution over one cohort.
///
/// Records are prepared once (candidates and anchors); each stage then only
/// looks at the records still pending in the [`ResolutionTable`].
pub struct ResolutionEngine<'a> {
    ctx: ResolutionContext<'a>,
    prepared: HashMap<RecordId, PreparedRecord<'a>>,
}

impl<'a> ResolutionEngine<'a> {
    pub fn new(ctx: ResolutionContext<'a>, records: &[RawDrugRecord]) -> Self {
        let prepared: HashMap<RecordId, PreparedRecord<'a>> = records
            .par_iter()
            .map(|record| (record.record_id.clone(), PreparedRecord::new(&ctx, record)))
            .collect();
        debug!(records = prepared.len(), "prepared drug records");
        Self { ctx, prepared }
    }

    pub fn context(&self) -> &ResolutionContext<'a> {
        &self.ctx
    }

    pub fn prepared(&self, record_id: &RecordId) -> Option<&PreparedRecord<'a>> {
        self.prepared.get(record_id)
    }

    /// Working table with one placeholder per prepared record.
    pub fn new_table(&self) -> ResolutionTable {
        ResolutionTable::new(self.prepared.keys().cloned())
    }

    /// Apply one rule to every pending record. Evaluation runs in parallel;
    /// matches are committed in record-id order. Returns the number of
    /// records resolved.
    pub fn apply_rule(&self, rule: &dyn MatchRule, table: &mut ResolutionTable) -> usize {
        if !rule.is_applicable(&self.ctx) {
            debug!(rule = rule.name(), "rule not applicable");
            return 0;
        }
        let pending = table.pending_ids();
        let found: Vec<(RecordId, Vec<ResolvedDrugMapping>)> = pending
            .par_iter()
            .filter_map(|record_id| {
                let record = self.prepared.get(record_id)?;
                let matches = rule.try_resolve(&self.ctx, record);
                if matches.is_empty() {
                    return None;
                }
                let rows = matches
                    .into_iter()
                    .map(|hit| {
                        ResolvedDrugMapping::resolved(
                            record_id.clone(),
                            hit.source,
                            hit.resolved,
                            hit.provenance,
                        )
                    })
                    .collect();
                Some((record_id.clone(), rows))
            })
            .collect();

        let mut resolved = 0usize;
        for (record_id, rows) in found {
            if table.commit(&record_id, rows) {
                resolved += 1;
            }
        }
        info!(
            rule = rule.name(),
            pending = pending.len(),
            resolved,
            "rule applied"
        );
        resolved
    }

    pub fn consolidate(&self, table: &mut ResolutionTable) -> ConsolidationSummary {
        let summary = consolidate(&self.ctx, table);
        info!(
            consolidated = summary.consolidated,
            removed = summary.removed,
            "consolidation applied"
        );
        summary
    }

    pub fn curation_queue(&self, table: &ResolutionTable) -> Vec<CurationQueueEntry> {
        let queue = curation_queue(table, &self.prepared, self.ctx.options.curation_threshold);
        info!(entries = queue.len(), "curation queue built");
        queue
    }

    pub fn apply_overrides(
        &self,
        table: &mut ResolutionTable,
        overrides: &[ManualOverrideEntry],
    ) -> usize {
        let merger = ManualOverrideMerger::new(self.ctx, overrides);
        let resolved = merger.apply(table, &self.prepared);
        info!(overrides = overrides.len(), resolved, "manual overrides merged");
        resolved
    }

    pub fn dedupe(&self, table: &mut ResolutionTable) -> usize {
        let removed = dedupe(table);
        debug!(removed, "working rows deduplicated");
        removed
    }

    pub fn finalize(&self, table: &ResolutionTable) -> Vec<ResolvedDrugMapping> {
        finalize(&self.ctx, table)
    }

    /// Run every stage in order on `table`.
    pub fn run(
        &self,
        table: &mut ResolutionTable,
        overrides: &[ManualOverrideEntry],
    ) -> ResolutionOutcome {
        let mut rule_counts = Vec::new();
        for rule in primary_rules() {
            rule_counts.push((rule.name(), self.apply_rule(rule.as_ref(), table)));
        }
        let consolidation = self.consolidate(table);
        for rule in fallback_rules() {
            rule_counts.push((rule.name(), self.apply_rule(rule.as_ref(), table)));
        }
        let curation_queue = self.curation_queue(table);
        let overrides_applied = self.apply_overrides(table, overrides);
        let duplicates_removed = self.dedupe(table);
        let mappings = self.finalize(table);
        ResolutionOutcome {
            mappings,
            curation_queue,
            rule_counts,
            consolidation,
            overrides_applied,
            duplicates_removed,
        }
    }
}
