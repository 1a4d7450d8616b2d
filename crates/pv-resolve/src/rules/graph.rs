//! Rules 5 and 6: relationship-graph traversal to a preferred ingredient.

use tracing::trace;

use pv_model::{Concept, ConceptId, ProvenanceCode, RelationType};

use super::{MatchRule, RuleMatch, dedupe_matches};
use crate::context::ResolutionContext;
use crate::prepared::PreparedRecord;

/// Preferred ingredient-level atoms one `relations` hop away from `concept_id`.
pub(crate) fn preferred_ingredients_via<'a>(
    ctx: &ResolutionContext<'a>,
    concept_id: &ConceptId,
    relations: &[RelationType],
) -> Vec<&'a Concept> {
    let mut found: Vec<&'a Concept> = Vec::new();
    for edge in ctx.index.outgoing(concept_id, relations) {
        for atom in ctx.index.atoms_of_concept(&edge.to_concept) {
            if ctx.is_preferred_ingredient(atom)
                && !found.iter().any(|known| known.atom_id == atom.atom_id)
            {
                found.push(atom);
            }
        }
    }
    found
}

/// An anchor atom outside the preferred vocabulary reaches a preferred
/// ingredient through one ingredient relation.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphIngredientRule;

impl MatchRule for GraphIngredientRule {
    fn name(&self) -> &'static str {
        "graph-ingredient"
    }

    fn try_resolve<'a>(
        &self,
        ctx: &ResolutionContext<'a>,
        record: &PreparedRecord<'a>,
    ) -> Vec<RuleMatch<'a>> {
        let mut matches = Vec::new();
        for anchor in record.anchors.iter().copied() {
            if ctx.is_preferred(anchor) {
                continue;
            }
            for target in
                preferred_ingredients_via(ctx, &anchor.concept_id, &RelationType::INGREDIENT)
            {
                matches.push(RuleMatch {
                    source: anchor,
                    resolved: target,
                    provenance: ProvenanceCode::GraphIngredient,
                });
            }
        }
        dedupe_matches(&mut matches);
        if !matches.is_empty() {
            trace!(record = %record.record_id, hits = matches.len(), "graph ingredient match");
        }
        matches
    }
}

/// An anchor's concept has an active-moiety relation to a concept holding a
/// clinical-substance atom, which reaches a preferred ingredient through one
/// ingredient relation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveMoietyRule;

impl MatchRule for ActiveMoietyRule {
    fn name(&self) -> &'static str {
        "graph-active-moiety"
    }

    fn try_resolve<'a>(
        &self,
        ctx: &ResolutionContext<'a>,
        record: &PreparedRecord<'a>,
    ) -> Vec<RuleMatch<'a>> {
        let mut matches = Vec::new();
        for anchor in record.anchors.iter().copied() {
            for moiety in ctx
                .index
                .outgoing(&anchor.concept_id, &RelationType::ACTIVE_MOIETY)
            {
                let holds_substance = ctx
                    .index
                    .atoms_of_concept(&moiety.to_concept)
                    .any(|atom| ctx.is_clinical_substance(atom));
                if !holds_substance {
                    continue;
                }
                for target in
                    preferred_ingredients_via(ctx, &moiety.to_concept, &RelationType::INGREDIENT)
                {
                    matches.push(RuleMatch {
                        source: anchor,
                        resolved: target,
                        provenance: ProvenanceCode::GraphActiveMoiety,
                    });
                }
            }
        }
        dedupe_matches(&mut matches);
        if !matches.is_empty() {
            trace!(record = %record.record_id, hits = matches.len(), "active moiety match");
        }
        matches
    }
}
