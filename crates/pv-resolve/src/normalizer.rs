//! Drug string cleaning.
//!
//! Raw drug names arrive as free text: mixed case, parenthesised qualifiers,
//! dosage forms, doses, list separators and stray punctuation. Cleaning
//! reduces them to the comparison form used by every exact-match rule.

use std::sync::LazyLock;

use regex::Regex;

use pv_model::{ResolutionOptions, normalize_key};

/// Innermost balanced parenthesis group.
static INNER_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^()]*\)").expect("Invalid paren group regex"));

/// Dose token such as `81 MG`, `0.5%` or `10 MG/ML`.
static DOSE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\d+(?:[.,]\d+)?\s*(?:(?:MCG|MG|UG|GM|G|ML|L|IU|UNITS?|MEQ|MMOL)\b(?:\s*/\s*(?:ML|L|G|KG|DOSE|ACTUAT|HR)\b)?|%)",
    )
    .expect("Invalid dose token regex")
});

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("Invalid digit regex"));

/// Leading/trailing characters trimmed from a cleaned string.
const TRIM_CHARS: &[char] = &[
    ' ', '.', ',', ';', ':', '-', '/', '\\', '*', '"', '\'', '#', '!', '?', '_', '&', '~',
];

/// Dosage-form and route words stripped from the end of a cleaned string.
const FORM_SUFFIXES: &[&str] = &[
    "TAB",
    "TABS",
    "TABLET",
    "TABLETS",
    "CAP",
    "CAPS",
    "CAPSULE",
    "CAPSULES",
    "GEL",
    "NOS",
    "FOR",
    "INJ",
    "INJECTION",
    "SOLN",
    "SOLUTION",
    "SUSP",
    "SUSPENSION",
    "CREAM",
    "OINTMENT",
    "ORAL",
    "PATCH",
    "SYRUP",
    "POWDER",
    "SPRAY",
    "DROPS",
];

/// Cleans raw drug strings with a bounded fixed-point loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringNormalizer {
    max_rounds: usize,
}

impl Default for StringNormalizer {
    fn default() -> Self {
        Self { max_rounds: 5 }
    }
}

impl StringNormalizer {
    pub fn new(max_rounds: usize) -> Self {
        Self {
            max_rounds: max_rounds.max(1),
        }
    }

    pub fn from_options(options: &ResolutionOptions) -> Self {
        Self::new(options.max_clean_rounds)
    }

    /// Canonical comparison form of `raw`. Idempotent.
    ///
    /// Rounds repeat until one leaves the string unchanged. When the round
    /// cap is hit first, remaining parenthesis characters are blanked and a
    /// final round settles the result.
    pub fn clean(&self, raw: &str) -> String {
        let mut current = raw.to_string();
        for _ in 0..self.max_rounds {
            let next = round(&current);
            if next == current {
                return current;
            }
            current = next;
        }
        round(&current.replace(['(', ')'], " "))
    }

    /// Ordered, distinct, non-empty lookup candidates for `raw`.
    ///
    /// The cleaned string comes first, then the cleaned contents of each
    /// outermost parenthesised group, then dose- and digit-stripped variants
    /// of all of those.
    pub fn candidates(&self, raw: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        push_unique(&mut out, self.clean(raw));
        for group in outermost_groups(raw) {
            push_unique(&mut out, self.clean(group));
        }

        let base = out.clone();
        for value in &base {
            let without_dose = DOSE_TOKEN.replace_all(value, " ");
            push_unique(&mut out, self.clean(&without_dose));
            let without_digits = DIGITS.replace_all(&without_dose, " ");
            push_unique(&mut out, self.clean(&without_digits));
        }
        out
    }
}

fn push_unique(out: &mut Vec<String>, value: String) {
    if !value.is_empty() && !out.contains(&value) {
        out.push(value);
    }
}

/// One cleaning round.
fn round(input: &str) -> String {
    let upper: String = input
        .chars()
        .flat_map(char::to_uppercase)
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect();
    let without_groups = INNER_GROUP.replace_all(&upper, " ");
    let collapsed = normalize_key(&without_groups);
    trim_affixes(&collapsed)
}

/// Trims punctuation and dosage-form suffixes until neither applies.
fn trim_affixes(input: &str) -> String {
    let mut current = input;
    loop {
        let trimmed = current.trim_matches(TRIM_CHARS);
        let stripped = strip_form_suffix(trimmed);
        if stripped == current {
            return stripped.to_string();
        }
        current = stripped;
    }
}

fn strip_form_suffix(value: &str) -> &str {
    for suffix in FORM_SUFFIXES {
        if let Some(rest) = value.strip_suffix(suffix)
            && let Some(rest) = rest.strip_suffix(' ')
        {
            return rest;
        }
    }
    value
}

/// Contents of each outermost balanced `( … )` group, in order.
fn outermost_groups(raw: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (idx, ch) in raw.char_indices() {
        match ch {
            '(' => {
                if depth == 0 {
                    start = idx + 1;
                }
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    groups.push(&raw[start..idx]);
                }
            }
            _ => {}
        }
    }
    groups
}
