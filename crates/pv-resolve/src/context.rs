//! Read-only inputs shared by every resolution rule.

use std::cmp::Ordering;

use pv_model::{
    Concept, ConceptId, CrossReferenceIndex, ResolutionOptions, ResolvedDrugMapping, TermType,
    TerminologyIndex,
};

use crate::normalizer::StringNormalizer;

/// Rank given to rows without a term type; sorts after every known one.
const UNRANKED: u8 = u8::MAX;

/// Terminology graph, optional cross-reference table and options, passed
/// explicitly to every rule.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
    pub index: &'a TerminologyIndex,
    pub xref: Option<&'a CrossReferenceIndex>,
    pub options: &'a ResolutionOptions,
    pub normalizer: StringNormalizer,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(index: &'a TerminologyIndex, options: &'a ResolutionOptions) -> Self {
        Self {
            index,
            xref: None,
            options,
            normalizer: StringNormalizer::from_options(options),
        }
    }

    pub fn with_xref(mut self, xref: Option<&'a CrossReferenceIndex>) -> Self {
        self.xref = xref.filter(|xref| !xref.is_empty());
        self
    }

    pub fn is_preferred(&self, atom: &Concept) -> bool {
        atom.is_vocabulary(&self.options.preferred_vocabulary)
    }

    /// Preferred-vocabulary atom at ingredient granularity.
    pub fn is_preferred_ingredient(&self, atom: &Concept) -> bool {
        self.is_preferred(atom) && atom.term_type.is_ingredient_level()
    }

    pub fn is_clinical_substance(&self, atom: &Concept) -> bool {
        atom.is_vocabulary(&self.options.clinical_substance_vocabulary)
    }

    /// Deterministic tie-break between atoms: term-type rank, preferred
    /// vocabulary first, then concept id and atom id.
    pub fn compare_atoms(&self, left: &Concept, right: &Concept) -> Ordering {
        left.term_type
            .rank()
            .cmp(&right.term_type.rank())
            .then_with(|| self.is_preferred(right).cmp(&self.is_preferred(left)))
            .then_with(|| left.concept_id.cmp(&right.concept_id))
            .then_with(|| left.atom_id.cmp(&right.atom_id))
    }

    /// Same tie-break applied to resolved rows.
    pub fn compare_rows(
        &self,
        left: &ResolvedDrugMapping,
        right: &ResolvedDrugMapping,
    ) -> Ordering {
        let rank = |row: &ResolvedDrugMapping| {
            row.resolved_term_type
                .as_ref()
                .map_or(UNRANKED, TermType::rank)
        };
        let preferred = |row: &ResolvedDrugMapping| {
            row.resolved_source_vocabulary
                .as_deref()
                .is_some_and(|vocabulary| {
                    vocabulary.eq_ignore_ascii_case(&self.options.preferred_vocabulary)
                })
        };
        right
            .is_resolved()
            .cmp(&left.is_resolved())
            .then_with(|| rank(left).cmp(&rank(right)))
            .then_with(|| preferred(right).cmp(&preferred(left)))
            .then_with(|| left.resolved_concept_id.cmp(&right.resolved_concept_id))
            .then_with(|| left.resolved_atom_id.cmp(&right.resolved_atom_id))
    }

    /// Best-ranked atom of `candidates`.
    pub fn best_atom<I>(&self, candidates: I) -> Option<&'a Concept>
    where
        I: IntoIterator<Item = &'a Concept>,
    {
        candidates
            .into_iter()
            .min_by(|left, right| self.compare_atoms(left, right))
    }

    /// Best-ranked atom of a concept, if the concept is in the graph.
    pub fn best_atom_of(&self, concept_id: &ConceptId) -> Option<&'a Concept> {
        self.best_atom(self.index.atoms_of_concept(concept_id))
    }
}
