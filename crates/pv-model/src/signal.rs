//! Contingency and disproportionality rows.

use serde::{Deserialize, Serialize};

use crate::ids::{ConceptId, EventId};

/// 2×2 contingency table of one (concept, event) pair.
///
/// | | event | other events |
/// |---|---|---|
/// | concept | `a` | `c` |
/// | other concepts | `b` | `d` |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContingencyCell {
    pub concept_id: ConceptId,
    pub event_id: EventId,
    pub a: i64,
    pub b: i64,
    pub c: i64,
    pub d: i64,
}

impl ContingencyCell {
    pub fn total(&self) -> i64 {
        self.a + self.b + self.c + self.d
    }

    /// Statistics are only defined when every cell is positive.
    pub fn is_eligible(&self) -> bool {
        self.a > 0 && self.b > 0 && self.c > 0 && self.d > 0
    }
}

/// Disproportionality scores of one eligible contingency cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalScore {
    pub concept_id: ConceptId,
    pub event_id: EventId,
    pub a: i64,
    pub expected_count: f64,
    pub prr: f64,
    pub prr_ci_low: f64,
    pub prr_ci_high: f64,
    pub chi_squared_yates: f64,
    pub ror: f64,
    pub ror_ci_low: f64,
    pub ror_ci_high: f64,
    pub ic: f64,
    pub ic_ci_low: f64,
    pub ic_ci_high: f64,
}

impl SignalScore {
    /// Conventional screening criterion: lower IC bound above zero.
    pub fn is_signal(&self) -> bool {
        self.ic_ci_low > 0.0
    }
}
