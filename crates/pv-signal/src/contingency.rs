//! 2×2 contingency tables from co-occurrence counts.

use std::collections::{BTreeMap, HashMap};

use tracing::info;

use pv_model::{ConceptId, ContingencyCell, EventId};

use crate::cooccurrence::PairKey;

/// Builds one [`ContingencyCell`] per observed (concept, event) pair.
///
/// With `a` the pair count, `b = event_margin - a`, `c = concept_margin - a`
/// and `d = N - event_margin - c`, so `a + b + c + d = N` for every cell.
#[derive(Debug, Clone, Default)]
pub struct ContingencyAggregator {
    counts: BTreeMap<PairKey, i64>,
    concept_margins: HashMap<ConceptId, i64>,
    event_margins: HashMap<EventId, i64>,
    total: i64,
}

impl ContingencyAggregator {
    /// Margins are the row and column sums of `counts`; N is their grand total.
    pub fn from_counts(counts: &BTreeMap<PairKey, i64>) -> Self {
        let mut concept_margins: HashMap<ConceptId, i64> = HashMap::new();
        let mut event_margins: HashMap<EventId, i64> = HashMap::new();
        let mut total = 0i64;
        for ((concept_id, event_id), a) in counts {
            *concept_margins.entry(concept_id.clone()).or_insert(0) += a;
            *event_margins.entry(event_id.clone()).or_insert(0) += a;
            total += a;
        }
        Self {
            counts: counts.clone(),
            concept_margins,
            event_margins,
            total,
        }
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn concept_margin(&self, concept_id: &ConceptId) -> i64 {
        self.concept_margins.get(concept_id).copied().unwrap_or(0)
    }

    pub fn event_margin(&self, event_id: &EventId) -> i64 {
        self.event_margins.get(event_id).copied().unwrap_or(0)
    }

    fn cell(&self, (concept_id, event_id): &PairKey, a: i64) -> ContingencyCell {
        let event_margin = self.event_margin(event_id);
        let b = event_margin - a;
        let c = self.concept_margin(concept_id) - a;
        let d = self.total - event_margin - c;
        ContingencyCell {
            concept_id: concept_id.clone(),
            event_id: event_id.clone(),
            a,
            b,
            c,
            d,
        }
    }

    /// Every pair with `a > 0`, in (concept, event) order.
    pub fn cells(&self) -> Vec<ContingencyCell> {
        let cells: Vec<ContingencyCell> = self
            .counts
            .iter()
            .filter(|(_, a)| **a > 0)
            .map(|(key, a)| self.cell(key, *a))
            .collect();
        let eligible = cells.iter().filter(|cell| cell.is_eligible()).count();
        info!(
            cells = cells.len(),
            eligible,
            excluded = cells.len() - eligible,
            total = self.total,
            "contingency tables built"
        );
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(concept: &str, event: &str) -> PairKey {
        (ConceptId::new(concept).unwrap(), EventId::new(event).unwrap())
    }

    #[test]
    fn textbook_cell_from_full_counts() {
        let counts = BTreeMap::from([
            (key("1191", "NAUSEA"), 15),
            (key("1191", "OTHER"), 105),
            (key("9999", "NAUSEA"), 25),
            (key("9999", "OTHER"), 9855),
        ]);
        let cells = ContingencyAggregator::from_counts(&counts).cells();
        assert_eq!(cells.len(), 4);
        let cell = &cells[0];
        assert_eq!(cell.concept_id.as_str(), "1191");
        assert_eq!(cell.event_id.as_str(), "NAUSEA");
        assert_eq!((cell.a, cell.b, cell.c, cell.d), (15, 25, 105, 9855));
        assert_eq!(cell.total(), 10_000);
    }

    #[test]
    fn margins_are_row_and_column_sums() {
        let counts = BTreeMap::from([
            (key("1", "RASH"), 3),
            (key("1", "NAUSEA"), 2),
            (key("2", "RASH"), 4),
            (key("3", "FEVER"), 0),
        ]);
        let aggregator = ContingencyAggregator::from_counts(&counts);
        assert_eq!(aggregator.total(), 9);
        assert_eq!(aggregator.concept_margin(&ConceptId::new("1").unwrap()), 5);
        assert_eq!(aggregator.event_margin(&EventId::new("RASH").unwrap()), 7);

        let cells = aggregator.cells();
        assert_eq!(cells.len(), 3);
        let rash = cells
            .iter()
            .find(|cell| cell.concept_id.as_str() == "1" && cell.event_id.as_str() == "RASH")
            .unwrap();
        assert_eq!((rash.a, rash.b, rash.c, rash.d), (3, 4, 2, 0));
        assert!(!rash.is_eligible());
        assert!(cells.iter().all(|cell| cell.total() == 9));
    }
}
