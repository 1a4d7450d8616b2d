//! Working resolution table with an explicit pending/resolved partition.

use std::collections::BTreeMap;

use pv_model::{ProvenanceCode, RecordId, ResolvedDrugMapping};

/// Working rows per record.
///
/// A pending record holds exactly one placeholder row. A resolved record
/// holds one or more resolved rows (several while candidate atoms are still
/// being narrowed down; one after finalisation). Matching stages only ever
/// write to pending records.
#[derive(Debug, Clone, Default)]
pub struct ResolutionTable {
    rows: BTreeMap<RecordId, Vec<ResolvedDrugMapping>>,
}

impl ResolutionTable {
    /// One placeholder per record id.
    pub fn new(record_ids: impl IntoIterator<Item = RecordId>) -> Self {
        let rows = record_ids
            .into_iter()
            .map(|id| (id.clone(), vec![ResolvedDrugMapping::placeholder(id)]))
            .collect();
        Self { rows }
    }

    /// Rebuild a table from previously written rows.
    pub fn from_rows(rows: impl IntoIterator<Item = ResolvedDrugMapping>) -> Self {
        let mut table = Self::default();
        for row in rows {
            table.rows.entry(row.record_id.clone()).or_default().push(row);
        }
        for rows in table.rows.values_mut() {
            normalize_partition(rows);
        }
        table
    }

    /// Seed pending records with resolutions from a previous run. Saved rows
    /// for records not in this table are ignored. Returns the number of
    /// records seeded.
    pub fn seed(&mut self, saved: impl IntoIterator<Item = ResolvedDrugMapping>) -> usize {
        let saved = Self::from_rows(saved);
        let mut seeded = 0usize;
        for (record_id, rows) in saved.rows {
            if !rows.iter().any(ResolvedDrugMapping::is_resolved) {
                continue;
            }
            if self.commit(&record_id, rows) {
                seeded += 1;
            }
        }
        seeded
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_pending(&self, record_id: &RecordId) -> bool {
        self.rows
            .get(record_id)
            .is_some_and(|rows| !rows.iter().any(ResolvedDrugMapping::is_resolved))
    }

    /// Pending record ids in record-id order.
    pub fn pending_ids(&self) -> Vec<RecordId> {
        self.rows
            .iter()
            .filter(|(_, rows)| !rows.iter().any(ResolvedDrugMapping::is_resolved))
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.rows
            .values()
            .filter(|rows| !rows.iter().any(ResolvedDrugMapping::is_resolved))
            .count()
    }

    pub fn resolved_count(&self) -> usize {
        self.len() - self.pending_count()
    }

    /// Replace the placeholder of a pending record with resolved rows.
    ///
    /// Returns `false` (and changes nothing) when the record is unknown,
    /// already resolved, or `rows` contains no resolution.
    pub fn commit(&mut self, record_id: &RecordId, mut rows: Vec<ResolvedDrugMapping>) -> bool {
        if !self.is_pending(record_id) {
            return false;
        }
        rows.retain(ResolvedDrugMapping::is_resolved);
        if rows.is_empty() {
            return false;
        }
        for row in &mut rows {
            row.record_id = record_id.clone();
        }
        self.rows.insert(record_id.clone(), rows);
        true
    }

    pub fn rows_of(&self, record_id: &RecordId) -> &[ResolvedDrugMapping] {
        self.rows.get(record_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// All rows in record-id order.
    pub fn rows(&self) -> impl Iterator<Item = &ResolvedDrugMapping> {
        self.rows.values().flatten()
    }

    pub fn records(&self) -> impl Iterator<Item = (&RecordId, &[ResolvedDrugMapping])> {
        self.rows.iter().map(|(id, rows)| (id, rows.as_slice()))
    }

    pub(crate) fn records_mut(
        &mut self,
    ) -> impl Iterator<Item = (&RecordId, &mut Vec<ResolvedDrugMapping>)> {
        self.rows.iter_mut()
    }

    /// Resolved records per provenance code.
    pub fn provenance_counts(&self) -> BTreeMap<ProvenanceCode, usize> {
        let mut counts = BTreeMap::new();
        for rows in self.rows.values() {
            if let Some(code) = rows.iter().find_map(|row| row.provenance_code) {
                *counts.entry(code).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// Drop placeholders next to resolved rows; keep a single placeholder when
/// nothing is resolved.
fn normalize_partition(rows: &mut Vec<ResolvedDrugMapping>) {
    if rows.iter().any(ResolvedDrugMapping::is_resolved) {
        rows.retain(ResolvedDrugMapping::is_resolved);
    } else if let Some(first) = rows.first().cloned() {
        *rows = vec![ResolvedDrugMapping::placeholder(first.record_id)];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> RecordId {
        RecordId::new(value).unwrap()
    }

    fn resolved(record: &str, concept: &str) -> ResolvedDrugMapping {
        let mut row = ResolvedDrugMapping::placeholder(id(record));
        row.resolved_concept_id = Some(pv_model::ConceptId::new(concept).unwrap());
        row.provenance_code = Some(ProvenanceCode::ManualOverride);
        row
    }

    #[test]
    fn commit_only_touches_pending_records() {
        let mut table = ResolutionTable::new([id("2"), id("1")]);
        assert_eq!(table.pending_ids(), vec![id("1"), id("2")]);
        assert!(table.commit(&id("1"), vec![resolved("1", "10")]));
        assert!(!table.commit(&id("1"), vec![resolved("1", "11")]));
        assert!(!table.commit(&id("9"), vec![resolved("9", "11")]));
        assert!(!table.commit(&id("2"), vec![ResolvedDrugMapping::placeholder(id("2"))]));
        assert_eq!(table.pending_ids(), vec![id("2")]);
        assert_eq!(
            table.rows_of(&id("1"))[0].resolved_concept_id.as_ref().unwrap().as_str(),
            "10"
        );
    }

    #[test]
    fn seeding_restores_saved_resolutions() {
        let mut table = ResolutionTable::new([id("1"), id("2")]);
        let seeded = table.seed(vec![
            resolved("1", "10"),
            ResolvedDrugMapping::placeholder(id("2")),
            resolved("3", "30"),
        ]);
        assert_eq!(seeded, 1);
        assert_eq!(table.len(), 2);
        assert_eq!(table.pending_ids(), vec![id("2")]);
        assert_eq!(table.provenance_counts()[&ProvenanceCode::ManualOverride], 1);
    }
}
