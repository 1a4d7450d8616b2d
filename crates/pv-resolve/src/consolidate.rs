//! Consolidation of preferred-vocabulary product-level resolutions onto
//! their ingredient.

use std::collections::HashSet;

use tracing::debug;

use pv_model::{AtomId, Concept, RelationType, ResolvedDrugMapping, TermType};

use crate::context::ResolutionContext;
use crate::rules::preferred_ingredients_via;
use crate::table::ResolutionTable;

/// Relations followed from a product-level concept to its ingredient.
const CONSOLIDATION_RELATIONS: [RelationType; 4] = [
    RelationType::HasIngredient,
    RelationType::IngredientOf,
    RelationType::HasTradename,
    RelationType::TradenameOf,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsolidationSummary {
    /// Rows moved onto an ingredient-level atom.
    pub consolidated: usize,
    /// Rows removed because the record already resolved to the same atom.
    pub removed: usize,
}

fn needs_consolidation(ctx: &ResolutionContext<'_>, row: &ResolvedDrugMapping) -> bool {
    let preferred_vocabulary = ctx.options.preferred_vocabulary.as_str();
    let preferred = row
        .resolved_source_vocabulary
        .as_deref()
        .is_some_and(|vocabulary| vocabulary.eq_ignore_ascii_case(preferred_vocabulary));
    let ingredient_level = row
        .resolved_term_type
        .as_ref()
        .is_some_and(TermType::is_ingredient_level);
    row.is_resolved() && preferred && !ingredient_level
}

fn replacement<'a>(
    ctx: &ResolutionContext<'a>,
    row: &ResolvedDrugMapping,
) -> Option<&'a Concept> {
    if !needs_consolidation(ctx, row) {
        return None;
    }
    let concept_id = row.resolved_concept_id.as_ref()?;
    ctx.best_atom(preferred_ingredients_via(ctx, concept_id, &CONSOLIDATION_RELATIONS))
}

fn consolidation_note(row: &ResolvedDrugMapping) -> String {
    format!(
        "consolidated from {} {} ({})",
        row.resolved_atom_id
            .as_ref()
            .map(AtomId::as_str)
            .unwrap_or_default(),
        row.resolved_term_type
            .as_ref()
            .map(TermType::code)
            .unwrap_or_default(),
        row.resolved_string.as_deref().unwrap_or_default(),
    )
}

/// Moves every resolved preferred-vocabulary row below ingredient level to
/// the best-ranked preferred ingredient one direct ingredient or trade-name
/// relation away. Provenance is kept and an audit note appended.
///
/// Candidates are visited in row tie-break order, so when two rows of a
/// record land on the same ingredient the better-ranked source is kept and
/// the other row is removed in the same pass.
pub fn consolidate(
    ctx: &ResolutionContext<'_>,
    table: &mut ResolutionTable,
) -> ConsolidationSummary {
    let mut summary = ConsolidationSummary::default();
    for (record_id, rows) in table.records_mut() {
        let plan: Vec<Option<&Concept>> = rows.iter().map(|row| replacement(ctx, row)).collect();
        if plan.iter().all(Option::is_none) {
            continue;
        }
        let mut resolved_atoms: HashSet<AtomId> = rows
            .iter()
            .zip(&plan)
            .filter(|(_, target)| target.is_none())
            .filter_map(|(row, _)| row.resolved_atom_id.clone())
            .collect();

        let mut order: Vec<usize> = (0..rows.len()).filter(|idx| plan[*idx].is_some()).collect();
        order.sort_by(|left, right| ctx.compare_rows(&rows[*left], &rows[*right]));

        let mut keep = vec![true; rows.len()];
        for idx in order {
            let Some(target) = plan[idx] else {
                continue;
            };
            if !resolved_atoms.insert(target.atom_id.clone()) {
                summary.removed += 1;
                keep[idx] = false;
                continue;
            }
            let row = &mut rows[idx];
            let note = consolidation_note(row);
            row.set_target(target);
            row.push_note(note);
            summary.consolidated += 1;
        }
        let mut keep = keep.into_iter();
        rows.retain(|_| keep.next().unwrap_or(true));
        debug!(record = %record_id, rows = rows.len(), "consolidated record");
    }
    summary
}
