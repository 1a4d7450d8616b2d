//! Rule 8: concept-id equality, regardless of vocabulary or term type.

use pv_model::{ConceptId, ProvenanceCode};

use super::{MatchRule, RuleMatch, dedupe_matches};
use crate::context::ResolutionContext;
use crate::prepared::PreparedRecord;

/// Resolves to the best-ranked atom of an anchor's concept, or of a concept
/// whose id equals one of the record's candidate strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConceptIdFallbackRule;

impl MatchRule for ConceptIdFallbackRule {
    fn name(&self) -> &'static str {
        "concept-id-fallback"
    }

    fn try_resolve<'a>(
        &self,
        ctx: &ResolutionContext<'a>,
        record: &PreparedRecord<'a>,
    ) -> Vec<RuleMatch<'a>> {
        let mut matches = Vec::new();
        for anchor in record.anchors.iter().copied() {
            if let Some(best) = ctx.best_atom_of(&anchor.concept_id) {
                matches.push(RuleMatch {
                    source: anchor,
                    resolved: best,
                    provenance: ProvenanceCode::ConceptIdFallback,
                });
            }
        }
        if matches.is_empty() {
            for (candidate, _) in record.candidates() {
                let Ok(concept_id) = ConceptId::new(candidate) else {
                    continue;
                };
                if let Some(best) = ctx.best_atom_of(&concept_id) {
                    matches.push(RuleMatch::direct(best, ProvenanceCode::ConceptIdFallback));
                    break;
                }
            }
        }
        dedupe_matches(&mut matches);
        matches
    }
}
