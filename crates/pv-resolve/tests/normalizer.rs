use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

use pv_resolve::StringNormalizer;

proptest! {
    #[test]
    fn clean_is_idempotent(raw in "[a-zA-Z0-9 ()/;,|+.\\-*#&~\\t]{0,40}") {
        let normalizer = StringNormalizer::default();
        let once = normalizer.clean(&raw);
        prop_assert_eq!(normalizer.clean(&once), once);
    }

    #[test]
    fn clean_is_idempotent_with_small_round_cap(raw in "[A-Z ()]{0,30}") {
        let normalizer = StringNormalizer::new(2);
        let once = normalizer.clean(&raw);
        prop_assert_eq!(normalizer.clean(&once), once);
    }

    #[test]
    fn candidates_are_distinct_and_non_empty(raw in "[a-zA-Z0-9 ()%.]{0,40}") {
        let candidates = StringNormalizer::default().candidates(&raw);
        for (idx, candidate) in candidates.iter().enumerate() {
            prop_assert!(!candidate.is_empty());
            prop_assert!(!candidates[..idx].contains(candidate));
        }
    }
}
