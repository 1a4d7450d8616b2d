//! Cohort input rows: drug records and adverse-event records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{CaseId, EventId, RecordId};
use crate::Result;

/// Reported role of a drug in a case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DrugRole {
    /// `PS`
    PrimarySuspect,
    /// `SS`
    SecondarySuspect,
    /// `C`
    Concomitant,
    /// `I`
    Interacting,
    #[default]
    Unknown,
    Other(String),
}

impl DrugRole {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "PS" => Self::PrimarySuspect,
            "SS" => Self::SecondarySuspect,
            "C" => Self::Concomitant,
            "I" => Self::Interacting,
            "" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::PrimarySuspect => "PS",
            Self::SecondarySuspect => "SS",
            Self::Concomitant => "C",
            Self::Interacting => "I",
            Self::Unknown => "",
            Self::Other(code) => code,
        }
    }

    pub fn is_suspect(&self) -> bool {
        matches!(self, Self::PrimarySuspect | Self::SecondarySuspect)
    }
}

impl From<String> for DrugRole {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<DrugRole> for String {
    fn from(value: DrugRole) -> Self {
        value.code().to_string()
    }
}

impl fmt::Display for DrugRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One drug row of a case report, already joined to the validated cohort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDrugRecord {
    pub record_id: RecordId,
    pub case_id: CaseId,
    pub sequence_no: u32,
    pub role: DrugRole,
    /// Reporting period tag, e.g. `2019Q3`. Empty when not reported.
    pub period: String,
    pub raw_drug_name: String,
    pub raw_active_ingredient: String,
    pub application_number: Option<String>,
}

impl RawDrugRecord {
    /// Convenience constructor for a record with only a drug name.
    pub fn named(record_id: &str, case_id: &str, raw_drug_name: &str) -> Result<Self> {
        Ok(Self {
            record_id: RecordId::new(record_id)?,
            case_id: CaseId::new(case_id)?,
            sequence_no: 1,
            role: DrugRole::PrimarySuspect,
            period: String::new(),
            raw_drug_name: raw_drug_name.to_string(),
            raw_active_ingredient: String::new(),
            application_number: None,
        })
    }

    pub fn with_active_ingredient(mut self, value: impl Into<String>) -> Self {
        self.raw_active_ingredient = value.into();
        self
    }

    pub fn with_application_number(mut self, value: impl Into<String>) -> Self {
        self.application_number = Some(value.into());
        self
    }

    pub fn with_role(mut self, role: DrugRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = period.into();
        self
    }
}

/// One adverse-event (reaction) row of a case report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub case_id: CaseId,
    pub event_term: String,
}

impl EventRecord {
    pub fn new(case_id: &str, event_term: &str) -> Result<Self> {
        Ok(Self {
            case_id: CaseId::new(case_id)?,
            event_term: event_term.to_string(),
        })
    }

    /// Uppercased, whitespace-collapsed event term. `None` for blank terms.
    pub fn event_id(&self) -> Option<EventId> {
        let normalized = self
            .event_term
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();
        EventId::new(normalized).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_faers_codes() {
        assert_eq!(DrugRole::parse("ps"), DrugRole::PrimarySuspect);
        assert_eq!(DrugRole::parse(" C "), DrugRole::Concomitant);
        assert_eq!(DrugRole::parse(""), DrugRole::Unknown);
        assert_eq!(DrugRole::parse("X").code(), "X");
        assert!(DrugRole::SecondarySuspect.is_suspect());
        assert!(!DrugRole::Interacting.is_suspect());
    }

    #[test]
    fn event_ids_are_normalized() {
        let event = EventRecord::new("1", "  nausea   and\tvomiting ").unwrap();
        assert_eq!(event.event_id().unwrap().as_str(), "NAUSEA AND VOMITING");
        let blank = EventRecord::new("1", "   ").unwrap();
        assert!(blank.event_id().is_none());
    }
}
