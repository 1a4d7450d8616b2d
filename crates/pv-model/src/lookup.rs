//! Lookup-key normalization shared by the terminology index and the
//! string normalizer, so both sides of an exact match agree on the form.

/// Characters that act as list separators inside drug strings.
pub const SEPARATORS: [char; 5] = [';', '|', ',', '+', '/'];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Gap {
    None,
    Space,
    Separator,
}

/// Builds the comparison key of a terminology or drug string.
///
/// Uppercases, turns control characters into whitespace, collapses a run of
/// separators (with the whitespace around it) into a single `/` and any other
/// whitespace run into one space. Leading and trailing whitespace is dropped.
pub fn normalize_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut gap = Gap::None;
    for ch in raw.chars().flat_map(char::to_uppercase) {
        if SEPARATORS.contains(&ch) {
            gap = Gap::Separator;
            continue;
        }
        if ch.is_whitespace() || ch.is_control() {
            if gap == Gap::None {
                gap = Gap::Space;
            }
            continue;
        }
        match gap {
            Gap::Separator => out.push('/'),
            Gap::Space if !out.is_empty() => out.push(' '),
            _ => {}
        }
        gap = Gap::None;
        out.push(ch);
    }
    if gap == Gap::Separator {
        out.push('/');
    }
    out
}

/// Normalizes an application number (NDA/ANDA/BLA) for cross-reference lookup.
///
/// Non-digits and leading zeros are removed, so `NDA020998`, `020998` and
/// `20998` share a key. Returns `None` when no significant digit remains.
pub fn normalize_application_number(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        None
    } else {
        Some(significant.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_collapses_separators_and_whitespace() {
        assert_eq!(normalize_key("aspirin ;  caffeine"), "ASPIRIN/CAFFEINE");
        assert_eq!(normalize_key("Aspirin / Caffeine"), "ASPIRIN/CAFFEINE");
        assert_eq!(normalize_key("  acetyl\tsalicylic   acid "), "ACETYL SALICYLIC ACID");
        assert_eq!(normalize_key("a,,|b"), "A/B");
    }

    #[test]
    fn key_is_idempotent() {
        for raw in ["x ; y", "/lead", "trail+", "  mixed\u{7}ctrl  ", ""] {
            let once = normalize_key(raw);
            assert_eq!(normalize_key(&once), once);
        }
    }

    #[test]
    fn application_numbers_share_a_key() {
        assert_eq!(normalize_application_number("NDA020998").as_deref(), Some("20998"));
        assert_eq!(normalize_application_number("020998").as_deref(), Some("20998"));
        assert_eq!(normalize_application_number("000"), None);
        assert_eq!(normalize_application_number(""), None);
    }
}
