//! Matching rules and their fixed precedence.
//!
//! Each rule implements [`MatchRule`]: a pure function from one prepared
//! record and the read-only [`ResolutionContext`] to the atoms it resolves
//! to. The engine applies rules in [`primary_rules`] order to the records
//! still pending, runs consolidation, then the [`fallback_rules`].
//!
//! # Example
//!
//! ```ignore
//! use pv_resolve::rules::{MatchRule, primary_rules};
//!
//! for rule in primary_rules() {
//!     let matches = rule.try_resolve(&ctx, &prepared);
//!     if !matches.is_empty() {
//!         break;
//!     }
//! }
//! ```

mod direct;
mod fallback;
mod graph;
mod xref;

pub use direct::{DirectMatchRule, DirectTarget};
pub use fallback::ConceptIdFallbackRule;
pub use graph::{ActiveMoietyRule, GraphIngredientRule};
pub(crate) use graph::preferred_ingredients_via;
pub use xref::CrossReferenceRule;

use std::collections::HashSet;

use pv_model::{Concept, ProvenanceCode};

use crate::context::ResolutionContext;
use crate::prepared::PreparedRecord;

/// One atom a rule resolved a record to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch<'a> {
    /// Upstream atom the match was anchored on.
    pub source: &'a Concept,
    pub resolved: &'a Concept,
    pub provenance: ProvenanceCode,
}

impl<'a> RuleMatch<'a> {
    /// Direct match: the matched atom is both source and target.
    pub fn direct(atom: &'a Concept, provenance: ProvenanceCode) -> Self {
        Self {
            source: atom,
            resolved: atom,
            provenance,
        }
    }
}

/// A matching strategy.
pub trait MatchRule: Send + Sync {
    /// Stage name used in logs and the run log (e.g. "direct-ingredient").
    fn name(&self) -> &'static str;

    /// Atoms `record` resolves to under this rule; empty when it does not apply.
    fn try_resolve<'a>(
        &self,
        ctx: &ResolutionContext<'a>,
        record: &PreparedRecord<'a>,
    ) -> Vec<RuleMatch<'a>>;

    /// Whether the rule can produce anything with the given inputs.
    fn is_applicable(&self, _ctx: &ResolutionContext<'_>) -> bool {
        true
    }
}

/// Rules 1 to 6, in precedence order.
pub fn primary_rules() -> Vec<Box<dyn MatchRule>> {
    vec![
        Box::new(DirectMatchRule::new(DirectTarget::PreferredIngredient)),
        Box::new(DirectMatchRule::new(DirectTarget::AnyVocabularyIngredient)),
        Box::new(DirectMatchRule::new(DirectTarget::PreferredVocabulary)),
        Box::new(CrossReferenceRule),
        Box::new(GraphIngredientRule),
        Box::new(ActiveMoietyRule),
    ]
}

/// Rules applied after consolidation.
pub fn fallback_rules() -> Vec<Box<dyn MatchRule>> {
    vec![Box::new(ConceptIdFallbackRule)]
}

/// Deduplicate matches on (source, resolved) atom, keeping first occurrences.
pub(crate) fn dedupe_matches(matches: &mut Vec<RuleMatch<'_>>) {
    let mut seen = HashSet::with_capacity(matches.len());
    matches.retain(|found| {
        seen.insert((
            found.source.atom_id.clone(),
            found.resolved.atom_id.clone(),
        ))
    });
}
