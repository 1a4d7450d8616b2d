//! Rule 4: resolution through the application-number cross-reference.

use tracing::trace;

use pv_model::{CrossReferenceEntry, CrossReferenceIndex};

use super::{DirectTarget, MatchRule, RuleMatch, dedupe_matches};
use crate::context::ResolutionContext;
use crate::prepared::PreparedRecord;

/// Follows cross-reference entries keyed by the record's application number,
/// then by its candidate strings, and resolves to an atom of the linked
/// atom's concept that satisfies one of the direct-match targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossReferenceRule;

impl CrossReferenceRule {
    fn resolve_entries<'a, 'e>(
        ctx: &ResolutionContext<'a>,
        entries: impl Iterator<Item = &'e CrossReferenceEntry>,
        target: DirectTarget,
        by_application_number: bool,
    ) -> Vec<RuleMatch<'a>> {
        let provenance = target.xref_provenance(by_application_number);
        let mut matches = Vec::new();
        for entry in entries {
            let Some(linked) = ctx.index.atom(&entry.atom_id) else {
                continue;
            };
            for atom in ctx.index.atoms_of_concept(&linked.concept_id) {
                if target.accepts(ctx, atom) {
                    matches.push(RuleMatch {
                        source: linked,
                        resolved: atom,
                        provenance,
                    });
                }
            }
        }
        dedupe_matches(&mut matches);
        matches
    }

    fn by_application_number<'a>(
        ctx: &ResolutionContext<'a>,
        xref: &CrossReferenceIndex,
        record: &PreparedRecord<'a>,
    ) -> Vec<RuleMatch<'a>> {
        let Some(number) = record.application_number.as_deref() else {
            return Vec::new();
        };
        for target in DirectTarget::ALL {
            let matches =
                Self::resolve_entries(ctx, xref.by_application_number(number), target, true);
            if !matches.is_empty() {
                return matches;
            }
        }
        Vec::new()
    }

    fn by_string<'a>(
        ctx: &ResolutionContext<'a>,
        xref: &CrossReferenceIndex,
        record: &PreparedRecord<'a>,
    ) -> Vec<RuleMatch<'a>> {
        for target in DirectTarget::ALL {
            for (candidate, _) in record.candidates() {
                let matches = Self::resolve_entries(ctx, xref.by_string(candidate), target, false);
                if !matches.is_empty() {
                    return matches;
                }
            }
        }
        Vec::new()
    }
}

impl MatchRule for CrossReferenceRule {
    fn name(&self) -> &'static str {
        "cross-reference"
    }

    fn try_resolve<'a>(
        &self,
        ctx: &ResolutionContext<'a>,
        record: &PreparedRecord<'a>,
    ) -> Vec<RuleMatch<'a>> {
        let Some(xref) = ctx.xref else {
            return Vec::new();
        };
        let mut matches = Self::by_application_number(ctx, xref, record);
        if matches.is_empty() {
            matches = Self::by_string(ctx, xref, record);
        }
        if !matches.is_empty() {
            trace!(record = %record.record_id, hits = matches.len(), "cross-reference match");
        }
        matches
    }

    fn is_applicable(&self, ctx: &ResolutionContext<'_>) -> bool {
        ctx.xref.is_some()
    }
}
