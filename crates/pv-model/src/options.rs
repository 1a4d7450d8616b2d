//! Configuration options for resolution and signal detection.

use serde::{Deserialize, Serialize};

use crate::record::DrugRole;
use crate::terminology::{DEFAULT_CLINICAL_SUBSTANCE_VOCABULARY, DEFAULT_PREFERRED_VOCABULARY};

/// Options controlling the drug-identity resolution engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionOptions {
    /// Vocabulary whose ingredient-level atoms are the resolution target.
    pub preferred_vocabulary: String,

    /// Vocabulary walked through by the active-moiety traversal.
    pub clinical_substance_vocabulary: String,

    /// Unresolved keys with more occurrences than this are queued for curation.
    /// Default: 199.
    pub curation_threshold: usize,

    /// Cap on string cleaning rounds. Default: 5.
    pub max_clean_rounds: usize,
}

impl Default for ResolutionOptions {
    fn default() -> Self {
        Self {
            preferred_vocabulary: DEFAULT_PREFERRED_VOCABULARY.to_string(),
            clinical_substance_vocabulary: DEFAULT_CLINICAL_SUBSTANCE_VOCABULARY.to_string(),
            curation_threshold: 199,
            max_clean_rounds: 5,
        }
    }
}

impl ResolutionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preferred_vocabulary(mut self, vocabulary: impl Into<String>) -> Self {
        self.preferred_vocabulary = vocabulary.into();
        self
    }

    pub fn with_clinical_substance_vocabulary(mut self, vocabulary: impl Into<String>) -> Self {
        self.clinical_substance_vocabulary = vocabulary.into();
        self
    }

    pub fn with_curation_threshold(mut self, threshold: usize) -> Self {
        self.curation_threshold = threshold;
        self
    }
}

/// Options controlling co-occurrence counting and the score table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalOptions {
    /// Only drug records with one of these roles are counted. Empty: all roles.
    pub roles: Vec<DrugRole>,

    /// Only drug records from these reporting periods are counted. Empty: all periods.
    pub periods: Vec<String>,

    /// Scores are only written for pairs with at least this many co-reports.
    pub min_cooccurrence: i64,
}

impl Default for SignalOptions {
    fn default() -> Self {
        Self {
            roles: Vec::new(),
            periods: Vec::new(),
            min_cooccurrence: 1,
        }
    }
}

impl SignalOptions {
    pub fn with_roles(mut self, roles: Vec<DrugRole>) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_periods(mut self, periods: Vec<String>) -> Self {
        self.periods = periods;
        self
    }

    pub fn with_min_cooccurrence(mut self, min: i64) -> Self {
        self.min_cooccurrence = min;
        self
    }

    pub fn accepts_role(&self, role: &DrugRole) -> bool {
        self.roles.is_empty() || self.roles.contains(role)
    }

    pub fn accepts_period(&self, period: &str) -> bool {
        self.periods.is_empty()
            || self
                .periods
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(period.trim()))
    }
}

/// All pipeline options, as read from a TOML config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub resolution: ResolutionOptions,
    pub signal: SignalOptions,
}
