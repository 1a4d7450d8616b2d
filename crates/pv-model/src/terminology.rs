//! Terminology graph model (RxNorm-shaped).
//!
//! The graph has two kinds of rows:
//!
//! - **Atoms** ([`Concept`]): one name of a concept from one source
//!   vocabulary, at one granularity (`term_type`). Many atoms share a
//!   `concept_id`; e.g. concept `1191` carries the RXNORM `IN` atom
//!   "aspirin" as well as MTHSPL and brand atoms.
//! - **Edges** ([`RelationEdge`]): directed concept-to-concept relations,
//!   read `from_concept --relation_type--> to_concept`.
//!
//! Cross-reference entries link an external key space (application numbers)
//! to atoms.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{AtomId, ConceptId};

/// Vocabulary whose ingredient-level atoms are the resolution target.
pub const DEFAULT_PREFERRED_VOCABULARY: &str = "RXNORM";

/// Vocabulary of FDA structured-product-label substances, used by the
/// active-moiety traversal.
pub const DEFAULT_CLINICAL_SUBSTANCE_VOCABULARY: &str = "MTHSPL";

/// Granularity tag of an atom.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TermType {
    /// `IN`
    Ingredient,
    /// `MIN`
    MultipleIngredients,
    /// `PIN`
    PreciseIngredient,
    /// `SCDC`
    ClinicalDrugComponent,
    /// `SCD`
    ClinicalDrug,
    /// `BN`
    BrandName,
    /// `SBD`
    BrandedDrug,
    /// `SU`
    Substance,
    Other(String),
}

impl TermType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "IN" => Self::Ingredient,
            "MIN" => Self::MultipleIngredients,
            "PIN" => Self::PreciseIngredient,
            "SCDC" => Self::ClinicalDrugComponent,
            "SCD" => Self::ClinicalDrug,
            "BN" => Self::BrandName,
            "SBD" => Self::BrandedDrug,
            "SU" => Self::Substance,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Ingredient => "IN",
            Self::MultipleIngredients => "MIN",
            Self::PreciseIngredient => "PIN",
            Self::ClinicalDrugComponent => "SCDC",
            Self::ClinicalDrug => "SCD",
            Self::BrandName => "BN",
            Self::BrandedDrug => "SBD",
            Self::Substance => "SU",
            Self::Other(code) => code,
        }
    }

    /// `IN`, `MIN` and `PIN` are the ingredient-level granularities.
    pub fn is_ingredient_level(&self) -> bool {
        matches!(
            self,
            Self::Ingredient | Self::MultipleIngredients | Self::PreciseIngredient
        )
    }

    /// Specificity rank used by deterministic tie-breaks (lower wins).
    pub fn rank(&self) -> u8 {
        match self {
            Self::Ingredient => 0,
            Self::PreciseIngredient => 1,
            Self::MultipleIngredients => 2,
            Self::ClinicalDrugComponent => 3,
            Self::ClinicalDrug => 4,
            Self::BrandName => 5,
            Self::BrandedDrug => 6,
            Self::Substance => 7,
            Self::Other(_) => 8,
        }
    }
}

impl From<String> for TermType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<TermType> for String {
    fn from(value: TermType) -> Self {
        value.code().to_string()
    }
}

impl fmt::Display for TermType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Relation label of an edge. Only the ingredient, active-moiety and
/// trade-name families are traversed; everything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationType {
    HasIngredient,
    IngredientOf,
    HasActiveMoiety,
    ActiveMoietyOf,
    HasTradename,
    TradenameOf,
    Other(String),
}

impl RelationType {
    /// Relations walked when moving from a product-level concept to its ingredient.
    pub const INGREDIENT: [RelationType; 2] = [Self::HasIngredient, Self::IngredientOf];
    pub const ACTIVE_MOIETY: [RelationType; 2] = [Self::HasActiveMoiety, Self::ActiveMoietyOf];
    pub const TRADENAME: [RelationType; 2] = [Self::HasTradename, Self::TradenameOf];

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "has_ingredient" => Self::HasIngredient,
            "ingredient_of" => Self::IngredientOf,
            "has_active_moiety" => Self::HasActiveMoiety,
            "active_moiety_of" => Self::ActiveMoietyOf,
            "has_tradename" => Self::HasTradename,
            "tradename_of" => Self::TradenameOf,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::HasIngredient => "has_ingredient",
            Self::IngredientOf => "ingredient_of",
            Self::HasActiveMoiety => "has_active_moiety",
            Self::ActiveMoietyOf => "active_moiety_of",
            Self::HasTradename => "has_tradename",
            Self::TradenameOf => "tradename_of",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for RelationType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<RelationType> for String {
    fn from(value: RelationType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One atom of the terminology graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub concept_id: ConceptId,
    pub atom_id: AtomId,
    pub display_string: String,
    pub source_vocabulary: String,
    pub term_type: TermType,
    /// Source-vocabulary code of the atom; may be empty.
    pub code: String,
}

impl Concept {
    pub fn is_vocabulary(&self, vocabulary: &str) -> bool {
        self.source_vocabulary.eq_ignore_ascii_case(vocabulary)
    }
}

/// Directed relation between two concepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationEdge {
    pub from_concept: ConceptId,
    pub to_concept: ConceptId,
    pub relation_type: RelationType,
    pub source_vocabulary: String,
}

/// Links an external identifier (application number) to a terminology atom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReferenceEntry {
    pub external_key: String,
    pub display_string: String,
    pub atom_id: AtomId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_types_round_trip_through_codes() {
        for code in ["IN", "MIN", "PIN", "SCDC", "SCD", "BN", "SBD", "SU", "DP"] {
            assert_eq!(TermType::parse(code).code(), code);
        }
        assert_eq!(TermType::parse(" in "), TermType::Ingredient);
    }

    #[test]
    fn ingredient_level_term_types() {
        assert!(TermType::Ingredient.is_ingredient_level());
        assert!(TermType::PreciseIngredient.is_ingredient_level());
        assert!(TermType::MultipleIngredients.is_ingredient_level());
        assert!(!TermType::ClinicalDrugComponent.is_ingredient_level());
        assert!(!TermType::Other("DP".to_string()).is_ingredient_level());
    }

    #[test]
    fn relation_labels_accept_common_spellings() {
        assert_eq!(RelationType::parse("has-ingredient"), RelationType::HasIngredient);
        assert_eq!(RelationType::parse("Active Moiety Of"), RelationType::ActiveMoietyOf);
        assert_eq!(
            RelationType::parse("reformulated_to"),
            RelationType::Other("reformulated_to".to_string())
        );
    }
}
