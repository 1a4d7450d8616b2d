#![deny(unsafe_code)]

use std::cmp::Ordering;
use std::fmt;

use crate::ModelError;

/// Orders identifiers numerically when both sides are plain digit strings
/// (RxCUIs, RxAUIs, FAERS primary ids), lexically otherwise.
///
/// Ties on numeric value fall back to the raw string so the ordering stays
/// consistent with `Eq` ("007" and "7" are distinct).
pub fn natural_cmp(left: &str, right: &str) -> Ordering {
    let left_digits = !left.is_empty() && left.bytes().all(|b| b.is_ascii_digit());
    let right_digits = !right.is_empty() && right.bytes().all(|b| b.is_ascii_digit());
    match (left_digits, right_digits) {
        (true, true) => {
            let l = left.trim_start_matches('0');
            let r = right.trim_start_matches('0');
            l.len()
                .cmp(&r.len())
                .then_with(|| l.cmp(r))
                .then_with(|| left.cmp(right))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => left.cmp(right),
    }
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ModelError::InvalidIdentifier {
                        kind: $kind,
                        value,
                    });
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                natural_cmp(&self.0, &other.0)
            }
        }
    };
}

identifier!(
    /// Terminology concept identifier (RxCUI). Shared by every atom of a concept.
    ConceptId,
    "concept id"
);
identifier!(
    /// Terminology atom identifier (RxAUI).
    AtomId,
    "atom id"
);
identifier!(
    /// Stable identifier of one drug row of a case report.
    RecordId,
    "record id"
);
identifier!(
    /// Case (report) identifier.
    CaseId,
    "case id"
);
identifier!(
    /// Normalized adverse-event term.
    EventId,
    "event id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_trimmed_and_non_empty() {
        assert_eq!(ConceptId::new(" 1191 ").unwrap().as_str(), "1191");
        assert!(AtomId::new("   ").is_err());
    }

    #[test]
    fn numeric_identifiers_sort_numerically() {
        let mut ids = vec![
            ConceptId::new("10").unwrap(),
            ConceptId::new("9").unwrap(),
            ConceptId::new("A1").unwrap(),
            ConceptId::new("100").unwrap(),
        ];
        ids.sort();
        let rendered: Vec<&str> = ids.iter().map(ConceptId::as_str).collect();
        assert_eq!(rendered, vec!["9", "10", "100", "A1"]);
    }

    #[test]
    fn leading_zeros_do_not_collapse_identity() {
        assert_eq!(natural_cmp("007", "7"), Ordering::Less);
        assert_ne!(RecordId::new("007").unwrap(), RecordId::new("7").unwrap());
    }
}
