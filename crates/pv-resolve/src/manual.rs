//! Manual-curation queue and curated overrides.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use pv_model::{
    ConceptId, CurationQueueEntry, ManualOverrideEntry, ProvenanceCode, RecordId,
    ResolvedDrugMapping,
};

use crate::context::ResolutionContext;
use crate::prepared::PreparedRecord;
use crate::table::ResolutionTable;

/// Unresolved-string key shared by the curation queue and manual overrides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurationKey {
    pub source_string: String,
    pub source_vocabulary: String,
    pub source_term_type: String,
}

impl CurationKey {
    /// Key of a pending record: its cleaned drug name and the vocabulary and
    /// term type of its best-ranked anchor (empty without one). `None` when
    /// the drug name cleans to nothing.
    pub fn of_record(record: &PreparedRecord<'_>) -> Option<Self> {
        if record.name_key.is_empty() {
            return None;
        }
        let anchor = record.primary_anchor();
        Some(Self {
            source_string: record.name_key.clone(),
            source_vocabulary: anchor
                .map(|atom| atom.source_vocabulary.to_uppercase())
                .unwrap_or_default(),
            source_term_type: anchor
                .map(|atom| atom.term_type.code().to_string())
                .unwrap_or_default(),
        })
    }

    pub fn of_override(ctx: &ResolutionContext<'_>, entry: &ManualOverrideEntry) -> Self {
        Self {
            source_string: ctx.normalizer.clean(&entry.source_string),
            source_vocabulary: entry.source_vocabulary.trim().to_uppercase(),
            source_term_type: entry.source_term_type.trim().to_uppercase(),
        }
    }
}

/// Keys of pending records occurring more than `threshold` times, most
/// frequent first.
pub fn curation_queue(
    table: &ResolutionTable,
    prepared: &HashMap<RecordId, PreparedRecord<'_>>,
    threshold: usize,
) -> Vec<CurationQueueEntry> {
    let mut counts: BTreeMap<CurationKey, usize> = BTreeMap::new();
    for record_id in table.pending_ids() {
        let Some(key) = prepared.get(&record_id).and_then(CurationKey::of_record) else {
            continue;
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    let mut queue: Vec<CurationQueueEntry> = counts
        .into_iter()
        .filter(|(_, occurrences)| *occurrences > threshold)
        .map(|(key, occurrences)| CurationQueueEntry {
            source_string: key.source_string,
            source_vocabulary: key.source_vocabulary,
            source_term_type: key.source_term_type,
            occurrences,
        })
        .collect();
    queue.sort_by(|left, right| {
        right
            .occurrences
            .cmp(&left.occurrences)
            .then_with(|| left.source_string.cmp(&right.source_string))
    });
    queue
}

/// Applies curated resolutions to pending records by key.
#[derive(Debug)]
pub struct ManualOverrideMerger<'a> {
    ctx: ResolutionContext<'a>,
    overrides: HashMap<CurationKey, (String, ConceptId)>,
}

impl<'a> ManualOverrideMerger<'a> {
    pub fn new(ctx: ResolutionContext<'a>, entries: &[ManualOverrideEntry]) -> Self {
        let mut overrides = HashMap::with_capacity(entries.len());
        for entry in entries {
            let key = CurationKey::of_override(&ctx, entry);
            if key.source_string.is_empty() {
                continue;
            }
            if !key.source_vocabulary.is_empty() || !key.source_term_type.is_empty() {
                warn!(
                    concept = %entry.final_concept_id,
                    vocabulary = %key.source_vocabulary,
                    term_type = %key.source_term_type,
                    "manual override keyed on an anchor cannot match a pending record"
                );
            }
            if overrides.contains_key(&key) {
                warn!(concept = %entry.final_concept_id, "duplicate manual override ignored");
                continue;
            }
            overrides.insert(
                key,
                (entry.source_string.clone(), entry.final_concept_id.clone()),
            );
        }
        Self { ctx, overrides }
    }

    fn resolution(
        &self,
        record: &PreparedRecord<'a>,
        source_string: &str,
        concept_id: &ConceptId,
    ) -> ResolvedDrugMapping {
        let mut row = ResolvedDrugMapping::placeholder(record.record_id.clone());
        match self.ctx.best_atom_of(concept_id) {
            Some(atom) => row.set_target(atom),
            None => row.resolved_concept_id = Some(concept_id.clone()),
        }
        row.source_atom_id = record.primary_anchor().map(|atom| atom.atom_id.clone());
        row.provenance_code = Some(ProvenanceCode::ManualOverride);
        row.push_note(format!(
            "manual override: {source_string} -> concept {concept_id}"
        ));
        row
    }

    /// Resolve every pending record whose key has an override. Returns the
    /// number of records resolved.
    pub fn apply(
        &self,
        table: &mut ResolutionTable,
        prepared: &HashMap<RecordId, PreparedRecord<'a>>,
    ) -> usize {
        if self.overrides.is_empty() {
            return 0;
        }
        let mut resolved = 0usize;
        for record_id in table.pending_ids() {
            let Some(record) = prepared.get(&record_id) else {
                continue;
            };
            let Some(key) = CurationKey::of_record(record) else {
                continue;
            };
            let Some((source_string, concept_id)) = self.overrides.get(&key) else {
                continue;
            };
            let row = self.resolution(record, source_string, concept_id);
            if table.commit(&record_id, vec![row]) {
                resolved += 1;
            }
        }
        debug!(resolved, "manual overrides applied");
        resolved
    }
}
