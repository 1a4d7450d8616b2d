//! Working-row deduplication and final single-row selection.

use std::collections::HashSet;

use pv_model::{AtomId, ResolvedDrugMapping};

use crate::context::ResolutionContext;
use crate::table::ResolutionTable;

/// Drop rows repeating an earlier row's `(record_id, source_atom_id,
/// resolved_atom_id)`. Returns the number of rows removed. Idempotent.
pub fn dedupe(table: &mut ResolutionTable) -> usize {
    let mut removed = 0usize;
    for (_, rows) in table.records_mut() {
        let before = rows.len();
        let mut seen: HashSet<(Option<AtomId>, Option<AtomId>)> = HashSet::new();
        rows.retain(|row| seen.insert((row.source_atom_id.clone(), row.resolved_atom_id.clone())));
        removed += before - rows.len();
    }
    removed
}

/// One row per record: the best-ranked resolved row, or the placeholder.
pub fn finalize(ctx: &ResolutionContext<'_>, table: &ResolutionTable) -> Vec<ResolvedDrugMapping> {
    table
        .records()
        .map(|(record_id, rows)| {
            rows.iter()
                .min_by(|left, right| ctx.compare_rows(left, right))
                .cloned()
                .unwrap_or_else(|| ResolvedDrugMapping::placeholder(record_id.clone()))
        })
        .collect()
}
