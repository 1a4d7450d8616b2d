//! Per-record lookup material computed once before matching.

use pv_model::{Concept, RawDrugRecord, RecordId};

use crate::context::ResolutionContext;

/// Cleaned candidates and anchor atoms of one drug record.
#[derive(Debug, Clone)]
pub struct PreparedRecord<'a> {
    pub record_id: RecordId,
    /// `clean(raw_drug_name)`; the manual-curation key string.
    pub name_key: String,
    pub name_candidates: Vec<String>,
    pub ingredient_candidates: Vec<String>,
    pub application_number: Option<String>,
    /// Atoms whose string equals a candidate, plus atoms cross-referenced
    /// by the record's application number; best-ranked first.
    pub anchors: Vec<&'a Concept>,
}

impl<'a> PreparedRecord<'a> {
    pub fn new(ctx: &ResolutionContext<'a>, record: &RawDrugRecord) -> Self {
        let normalizer = ctx.normalizer;
        let name_candidates = normalizer.candidates(&record.raw_drug_name);
        let ingredient_candidates = normalizer.candidates(&record.raw_active_ingredient);
        let application_number = record
            .application_number
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let mut anchors: Vec<&'a Concept> = Vec::new();
        for candidate in name_candidates.iter().chain(&ingredient_candidates) {
            for atom in ctx.index.atoms_by_string(candidate) {
                if !anchors.iter().any(|known| known.atom_id == atom.atom_id) {
                    anchors.push(atom);
                }
            }
        }
        if let (Some(xref), Some(number)) = (ctx.xref, application_number.as_deref()) {
            for entry in xref.by_application_number(number) {
                if let Some(atom) = ctx.index.atom(&entry.atom_id)
                    && !anchors.iter().any(|known| known.atom_id == atom.atom_id)
                {
                    anchors.push(atom);
                }
            }
        }
        anchors.sort_by(|left, right| ctx.compare_atoms(left, right));

        Self {
            record_id: record.record_id.clone(),
            name_key: normalizer.clean(&record.raw_drug_name),
            name_candidates,
            ingredient_candidates,
            application_number,
            anchors,
        }
    }

    /// Candidates from the drug name first, then from the active ingredient,
    /// each tagged with whether it came from the ingredient field.
    pub fn candidates(&self) -> impl Iterator<Item = (&str, bool)> {
        self.name_candidates
            .iter()
            .map(|value| (value.as_str(), false))
            .chain(
                self.ingredient_candidates
                    .iter()
                    .map(|value| (value.as_str(), true)),
            )
    }

    /// Best-ranked anchor; its vocabulary and term type key the curation queue.
    pub fn primary_anchor(&self) -> Option<&'a Concept> {
        self.anchors.first().copied()
    }
}
