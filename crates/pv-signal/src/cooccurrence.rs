//! Per-case (concept, event) co-occurrence counting.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, info};

use pv_model::{
    CaseId, ConceptId, EventId, EventRecord, RawDrugRecord, RecordId, ResolvedDrugMapping,
    SignalOptions,
};

/// (concept, event) pair.
pub type PairKey = (ConceptId, EventId);

/// Number of cases reporting each (concept, event) pair, plus counters of
/// the rows left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CooccurrenceCounts {
    pub pairs: BTreeMap<PairKey, i64>,
    /// Cases with at least one counted concept and one event.
    pub cases: usize,
    /// Drug records without a resolved concept.
    pub unresolved_records: usize,
    /// Drug records dropped by the role or period filter.
    pub filtered_records: usize,
    /// Event rows with a blank term.
    pub blank_events: usize,
}

impl CooccurrenceCounts {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, concept_id: &ConceptId, event_id: &EventId) -> i64 {
        self.pairs
            .get(&(concept_id.clone(), event_id.clone()))
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Default)]
struct CaseSummary {
    concepts: BTreeSet<ConceptId>,
    events: BTreeSet<EventId>,
}

/// Counts every (concept, event) pair once per case.
///
/// A case contributes the resolved concepts of its drug records that pass
/// the role and period filters, crossed with the event ids of its event rows.
/// Unresolved records are not counted.
pub fn count_cooccurrences(
    records: &[RawDrugRecord],
    mappings: &[ResolvedDrugMapping],
    events: &[EventRecord],
    options: &SignalOptions,
) -> CooccurrenceCounts {
    let resolved: HashMap<&RecordId, &ConceptId> = mappings
        .iter()
        .filter_map(|row| Some((&row.record_id, row.resolved_concept_id.as_ref()?)))
        .collect();

    let mut counts = CooccurrenceCounts::default();
    let mut cases: BTreeMap<&CaseId, CaseSummary> = BTreeMap::new();
    for record in records {
        if !options.accepts_role(&record.role) || !options.accepts_period(&record.period) {
            counts.filtered_records += 1;
            continue;
        }
        let Some(concept_id) = resolved.get(&record.record_id) else {
            counts.unresolved_records += 1;
            continue;
        };
        cases
            .entry(&record.case_id)
            .or_default()
            .concepts
            .insert((*concept_id).clone());
    }
    for event in events {
        let Some(event_id) = event.event_id() else {
            counts.blank_events += 1;
            continue;
        };
        if let Some(summary) = cases.get_mut(&event.case_id) {
            summary.events.insert(event_id);
        }
    }

    for (case_id, summary) in &cases {
        if summary.concepts.is_empty() || summary.events.is_empty() {
            debug!(case = %case_id, "case without concept/event pair");
            continue;
        }
        counts.cases += 1;
        for concept_id in &summary.concepts {
            for event_id in &summary.events {
                *counts
                    .pairs
                    .entry((concept_id.clone(), event_id.clone()))
                    .or_insert(0) += 1;
            }
        }
    }

    info!(
        cases = counts.cases,
        pairs = counts.pairs.len(),
        unresolved = counts.unresolved_records,
        filtered = counts.filtered_records,
        blank_events = counts.blank_events,
        "co-occurrence counted"
    );
    counts
}

#[cfg(test)]
mod tests {
    use pv_model::{DrugRole, ProvenanceCode};

    use super::*;

    fn resolved(record: &str, concept: &str) -> ResolvedDrugMapping {
        let mut row = ResolvedDrugMapping::placeholder(RecordId::new(record).unwrap());
        row.resolved_concept_id = Some(ConceptId::new(concept).unwrap());
        row.provenance_code = Some(ProvenanceCode::DirectMatchIngredient);
        row
    }

    fn key(concept: &str, event: &str) -> (ConceptId, EventId) {
        (ConceptId::new(concept).unwrap(), EventId::new(event).unwrap())
    }

    #[test]
    fn pairs_count_once_per_case() {
        let records = vec![
            RawDrugRecord::named("1", "C1", "aspirin").unwrap(),
            RawDrugRecord::named("2", "C1", "aspirin 81 mg").unwrap(),
            RawDrugRecord::named("3", "C2", "aspirin").unwrap(),
            RawDrugRecord::named("4", "C2", "mystery").unwrap(),
        ];
        let mappings = vec![
            resolved("1", "1191"),
            resolved("2", "1191"),
            resolved("3", "1191"),
            ResolvedDrugMapping::placeholder(RecordId::new("4").unwrap()),
        ];
        let events = vec![
            EventRecord::new("C1", "Nausea").unwrap(),
            EventRecord::new("C1", "NAUSEA ").unwrap(),
            EventRecord::new("C2", "nausea").unwrap(),
            EventRecord::new("C2", "  ").unwrap(),
            EventRecord::new("C3", "Rash").unwrap(),
        ];
        let counts = count_cooccurrences(&records, &mappings, &events, &SignalOptions::default());
        assert_eq!(counts.pairs.len(), 1);
        assert_eq!(counts.pairs[&key("1191", "NAUSEA")], 2);
        assert_eq!(counts.cases, 2);
        assert_eq!(counts.unresolved_records, 1);
        assert_eq!(counts.blank_events, 1);
    }

    #[test]
    fn role_and_period_filters_apply_to_drug_records() {
        let records = vec![
            RawDrugRecord::named("1", "C1", "aspirin")
                .unwrap()
                .with_period("2019Q3"),
            RawDrugRecord::named("2", "C1", "lipitor")
                .unwrap()
                .with_role(DrugRole::Concomitant)
                .with_period("2019Q3"),
            RawDrugRecord::named("3", "C2", "aspirin")
                .unwrap()
                .with_period("2019Q4"),
        ];
        let mappings = vec![resolved("1", "1191"), resolved("2", "83367"), resolved("3", "1191")];
        let events = vec![
            EventRecord::new("C1", "Rash").unwrap(),
            EventRecord::new("C2", "Rash").unwrap(),
        ];
        let options = SignalOptions::default()
            .with_roles(vec![DrugRole::PrimarySuspect])
            .with_periods(vec!["2019q3".to_string()]);
        let counts = count_cooccurrences(&records, &mappings, &events, &options);
        assert_eq!(counts.filtered_records, 2);
        assert_eq!(counts.get(&ConceptId::new("1191").unwrap(), &EventId::new("RASH").unwrap()), 1);
        assert_eq!(counts.get(&ConceptId::new("83367").unwrap(), &EventId::new("RASH").unwrap()), 0);
    }
}
