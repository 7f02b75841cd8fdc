//! Properties of the dedup normalization key

use proptest::prelude::*;
use serde_json::json;
use simmer::dedup::{find_existing, normalize};
use simmer::{Artifact, Language};

/// Normalizing a key again never changes it
#[test]
fn test_normalize_idempotence_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&any::<String>(), |name| {
            let once = normalize(&name);
            assert_eq!(normalize(&once), once);
            assert!(!once.chars().any(char::is_whitespace));
            Ok(())
        })
        .unwrap();
}

fn whitespace() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec![' ', '\t', '\n', '\u{3000}']),
        0..3,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

proptest! {
    /// Case changes and whitespace padding between words do not affect the key
    #[test]
    fn test_normalize_ignores_case_and_spacing(
        words in prop::collection::vec("[a-zA-Z]{1,8}", 1..4),
        gaps in prop::collection::vec(whitespace(), 5),
    ) {
        let plain = words.join(" ");
        let mut noisy = gaps[0].clone();
        for (i, word) in words.iter().enumerate() {
            noisy.push_str(&word.to_uppercase());
            noisy.push_str(&gaps[i + 1]);
        }
        prop_assert_eq!(normalize(&plain), normalize(&noisy));
        prop_assert_eq!(normalize(&plain), words.concat().to_lowercase());
    }

    /// A stored bilingual recipe is found by any case/spacing variant of its name
    #[test]
    fn test_stored_name_variants_hit_dedup(
        words in prop::collection::vec("[a-z]{1,8}", 1..4),
        upper in any::<bool>(),
    ) {
        let name_en = words.join(" ");
        let stored: Vec<Artifact> = vec![serde_json::from_value(json!({
            "id": "1",
            "name_zh": "菜",
            "name_en": name_en,
        }))
        .unwrap()];

        let mut query = words.join("  ");
        if upper {
            query = query.to_uppercase();
        }
        prop_assert!(find_existing(&stored, &query, Language::Zh).is_some());
        prop_assert!(find_existing(&stored, &query, Language::En).is_some());
    }
}
