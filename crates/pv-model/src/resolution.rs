//! Resolution output rows and the provenance vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;
use crate::ids::{AtomId, ConceptId, RecordId};
use crate::terminology::{Concept, TermType};

/// Joins audit notes in flat (CSV) renderings of a mapping row.
pub const AUDIT_NOTE_SEPARATOR: &str = " | ";

/// Which rule produced a resolution. Written once per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProvenanceCode {
    DirectMatchIngredient,
    DirectMatchIngredientProdAi,
    DirectMatchAnyVocabularyIngredient,
    DirectMatchAnyVocabularyIngredientProdAi,
    DirectMatchPreferredVocabulary,
    DirectMatchPreferredVocabularyProdAi,
    XrefApplicationNumberIngredient,
    XrefApplicationNumberAnyVocabularyIngredient,
    XrefApplicationNumberPreferredVocabulary,
    XrefStringIngredient,
    XrefStringAnyVocabularyIngredient,
    XrefStringPreferredVocabulary,
    GraphIngredient,
    GraphActiveMoiety,
    ConceptIdFallback,
    ManualOverride,
}

impl ProvenanceCode {
    pub const ALL: [ProvenanceCode; 16] = [
        Self::DirectMatchIngredient,
        Self::DirectMatchIngredientProdAi,
        Self::DirectMatchAnyVocabularyIngredient,
        Self::DirectMatchAnyVocabularyIngredientProdAi,
        Self::DirectMatchPreferredVocabulary,
        Self::DirectMatchPreferredVocabularyProdAi,
        Self::XrefApplicationNumberIngredient,
        Self::XrefApplicationNumberAnyVocabularyIngredient,
        Self::XrefApplicationNumberPreferredVocabulary,
        Self::XrefStringIngredient,
        Self::XrefStringAnyVocabularyIngredient,
        Self::XrefStringPreferredVocabulary,
        Self::GraphIngredient,
        Self::GraphActiveMoiety,
        Self::ConceptIdFallback,
        Self::ManualOverride,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectMatchIngredient => "direct-match-ingredient",
            Self::DirectMatchIngredientProdAi => "direct-match-ingredient-prod-ai",
            Self::DirectMatchAnyVocabularyIngredient => "direct-match-any-vocabulary-ingredient",
            Self::DirectMatchAnyVocabularyIngredientProdAi => {
                "direct-match-any-vocabulary-ingredient-prod-ai"
            }
            Self::DirectMatchPreferredVocabulary => "direct-match-preferred-vocabulary",
            Self::DirectMatchPreferredVocabularyProdAi => {
                "direct-match-preferred-vocabulary-prod-ai"
            }
            Self::XrefApplicationNumberIngredient => "xref-application-number-ingredient",
            Self::XrefApplicationNumberAnyVocabularyIngredient => {
                "xref-application-number-any-vocabulary-ingredient"
            }
            Self::XrefApplicationNumberPreferredVocabulary => {
                "xref-application-number-preferred-vocabulary"
            }
            Self::XrefStringIngredient => "xref-string-ingredient",
            Self::XrefStringAnyVocabularyIngredient => "xref-string-any-vocabulary-ingredient",
            Self::XrefStringPreferredVocabulary => "xref-string-preferred-vocabulary",
            Self::GraphIngredient => "graph-ingredient",
            Self::GraphActiveMoiety => "graph-active-moiety",
            Self::ConceptIdFallback => "concept-id-fallback",
            Self::ManualOverride => "manual-override",
        }
    }

    /// Position of the producing rule in the matching precedence (1-based;
    /// manual overrides come last).
    pub fn rule_number(self) -> u8 {
        match self {
            Self::DirectMatchIngredient | Self::DirectMatchIngredientProdAi => 1,
            Self::DirectMatchAnyVocabularyIngredient
            | Self::DirectMatchAnyVocabularyIngredientProdAi => 2,
            Self::DirectMatchPreferredVocabulary | Self::DirectMatchPreferredVocabularyProdAi => 3,
            Self::XrefApplicationNumberIngredient
            | Self::XrefApplicationNumberAnyVocabularyIngredient
            | Self::XrefApplicationNumberPreferredVocabulary
            | Self::XrefStringIngredient
            | Self::XrefStringAnyVocabularyIngredient
            | Self::XrefStringPreferredVocabulary => 4,
            Self::GraphIngredient => 5,
            Self::GraphActiveMoiety => 6,
            Self::ConceptIdFallback => 8,
            Self::ManualOverride => 9,
        }
    }
}

impl fmt::Display for ProvenanceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProvenanceCode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|code| code.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ModelError::UnknownProvenanceCode(needle.to_string()))
    }
}

/// One resolution row. Unresolved records keep a placeholder row with every
/// resolved field empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDrugMapping {
    pub record_id: RecordId,
    /// Upstream atom the match was anchored on; equals the resolved atom for
    /// direct matches.
    pub source_atom_id: Option<AtomId>,
    pub resolved_concept_id: Option<ConceptId>,
    pub resolved_atom_id: Option<AtomId>,
    pub resolved_string: Option<String>,
    pub resolved_source_vocabulary: Option<String>,
    pub resolved_term_type: Option<TermType>,
    pub provenance_code: Option<ProvenanceCode>,
    #[serde(default)]
    pub audit_notes: Vec<String>,
}

impl ResolvedDrugMapping {
    pub fn placeholder(record_id: RecordId) -> Self {
        Self {
            record_id,
            source_atom_id: None,
            resolved_concept_id: None,
            resolved_atom_id: None,
            resolved_string: None,
            resolved_source_vocabulary: None,
            resolved_term_type: None,
            provenance_code: None,
            audit_notes: Vec::new(),
        }
    }

    /// Row resolving `record_id` to `resolved`, anchored on `source`.
    pub fn resolved(
        record_id: RecordId,
        source: &Concept,
        resolved: &Concept,
        provenance: ProvenanceCode,
    ) -> Self {
        let mut row = Self::placeholder(record_id);
        row.source_atom_id = Some(source.atom_id.clone());
        row.set_target(resolved);
        row.provenance_code = Some(provenance);
        row
    }

    /// Overwrites the resolved fields with `atom`; provenance and notes are untouched.
    pub fn set_target(&mut self, atom: &Concept) {
        self.resolved_concept_id = Some(atom.concept_id.clone());
        self.resolved_atom_id = Some(atom.atom_id.clone());
        self.resolved_string = Some(atom.display_string.clone());
        self.resolved_source_vocabulary = Some(atom.source_vocabulary.clone());
        self.resolved_term_type = Some(atom.term_type.clone());
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_concept_id.is_some()
    }

    pub fn push_note(&mut self, note: impl Into<String>) {
        self.audit_notes.push(note.into());
    }
}

/// Curated resolution keyed on the unresolved string / vocabulary / term-type
/// triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualOverrideEntry {
    pub source_string: String,
    #[serde(default)]
    pub source_vocabulary: String,
    #[serde(default)]
    pub source_term_type: String,
    pub final_concept_id: ConceptId,
}

/// Frequent unresolved key surfaced for manual curation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurationQueueEntry {
    pub source_string: String,
    pub source_vocabulary: String,
    pub source_term_type: String,
    pub occurrences: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provenance_codes_parse_their_tags() {
        for code in ProvenanceCode::ALL {
            assert_eq!(code.as_str().parse::<ProvenanceCode>().unwrap(), code);
        }
        assert!("direct-match".parse::<ProvenanceCode>().is_err());
    }

    #[test]
    fn provenance_serializes_as_kebab_tag() {
        let json = serde_json::to_string(&ProvenanceCode::DirectMatchAnyVocabularyIngredientProdAi)
            .unwrap();
        assert_eq!(json, "\"direct-match-any-vocabulary-ingredient-prod-ai\"");
    }

    #[test]
    fn rule_numbers_follow_precedence() {
        let numbers: Vec<u8> = ProvenanceCode::ALL
            .iter()
            .copied()
            .map(ProvenanceCode::rule_number)
            .collect();
        assert!(numbers.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn placeholder_is_unresolved() {
        let row = ResolvedDrugMapping::placeholder(RecordId::new("1").unwrap());
        assert!(!row.is_resolved());
        assert!(row.provenance_code.is_none());
    }
}
