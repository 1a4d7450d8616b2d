//! Rules 1 to 3: exact string match against the terminology.

use tracing::trace;

use pv_model::{Concept, ProvenanceCode, TermType};

use super::{MatchRule, RuleMatch, dedupe_matches};
use crate::context::ResolutionContext;
use crate::prepared::PreparedRecord;

/// Which atoms an exact match may land on. Shared with the cross-reference
/// rule, which applies the same three filters through the linked concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectTarget {
    /// Preferred vocabulary, term type `IN`, `MIN` or `PIN`.
    PreferredIngredient,
    /// Term type `IN` in any vocabulary.
    AnyVocabularyIngredient,
    /// Preferred vocabulary, any term type.
    PreferredVocabulary,
}

impl DirectTarget {
    pub const ALL: [DirectTarget; 3] = [
        Self::PreferredIngredient,
        Self::AnyVocabularyIngredient,
        Self::PreferredVocabulary,
    ];

    pub fn accepts(self, ctx: &ResolutionContext<'_>, atom: &Concept) -> bool {
        match self {
            Self::PreferredIngredient => ctx.is_preferred_ingredient(atom),
            Self::AnyVocabularyIngredient => atom.term_type == TermType::Ingredient,
            Self::PreferredVocabulary => ctx.is_preferred(atom),
        }
    }

    /// Provenance of a direct match from the drug name or, when
    /// `from_ingredient`, from the active-ingredient field.
    pub fn direct_provenance(self, from_ingredient: bool) -> ProvenanceCode {
        match (self, from_ingredient) {
            (Self::PreferredIngredient, false) => ProvenanceCode::DirectMatchIngredient,
            (Self::PreferredIngredient, true) => ProvenanceCode::DirectMatchIngredientProdAi,
            (Self::AnyVocabularyIngredient, false) => {
                ProvenanceCode::DirectMatchAnyVocabularyIngredient
            }
            (Self::AnyVocabularyIngredient, true) => {
                ProvenanceCode::DirectMatchAnyVocabularyIngredientProdAi
            }
            (Self::PreferredVocabulary, false) => ProvenanceCode::DirectMatchPreferredVocabulary,
            (Self::PreferredVocabulary, true) => {
                ProvenanceCode::DirectMatchPreferredVocabularyProdAi
            }
        }
    }

    pub fn xref_provenance(self, by_application_number: bool) -> ProvenanceCode {
        match (self, by_application_number) {
            (Self::PreferredIngredient, true) => ProvenanceCode::XrefApplicationNumberIngredient,
            (Self::AnyVocabularyIngredient, true) => {
                ProvenanceCode::XrefApplicationNumberAnyVocabularyIngredient
            }
            (Self::PreferredVocabulary, true) => {
                ProvenanceCode::XrefApplicationNumberPreferredVocabulary
            }
            (Self::PreferredIngredient, false) => ProvenanceCode::XrefStringIngredient,
            (Self::AnyVocabularyIngredient, false) => {
                ProvenanceCode::XrefStringAnyVocabularyIngredient
            }
            (Self::PreferredVocabulary, false) => ProvenanceCode::XrefStringPreferredVocabulary,
        }
    }
}

/// Exact match of a record candidate against atom strings.
#[derive(Debug, Clone, Copy)]
pub struct DirectMatchRule {
    target: DirectTarget,
}

impl DirectMatchRule {
    pub fn new(target: DirectTarget) -> Self {
        Self { target }
    }
}

impl MatchRule for DirectMatchRule {
    fn name(&self) -> &'static str {
        match self.target {
            DirectTarget::PreferredIngredient => "direct-ingredient",
            DirectTarget::AnyVocabularyIngredient => "direct-any-vocabulary-ingredient",
            DirectTarget::PreferredVocabulary => "direct-preferred-vocabulary",
        }
    }

    fn try_resolve<'a>(
        &self,
        ctx: &ResolutionContext<'a>,
        record: &PreparedRecord<'a>,
    ) -> Vec<RuleMatch<'a>> {
        for (candidate, from_ingredient) in record.candidates() {
            let provenance = self.target.direct_provenance(from_ingredient);
            let mut matches: Vec<RuleMatch<'a>> = ctx
                .index
                .atoms_by_string(candidate)
                .filter(|atom| self.target.accepts(ctx, atom))
                .map(|atom| RuleMatch::direct(atom, provenance))
                .collect();
            if !matches.is_empty() {
                dedupe_matches(&mut matches);
                trace!(
                    record = %record.record_id,
                    rule = self.name(),
                    hits = matches.len(),
                    "direct match"
                );
                return matches;
            }
        }
        Vec::new()
    }
}
