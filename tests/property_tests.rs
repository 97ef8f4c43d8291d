/// Property-based tests using proptest
/// Tests invariants of the health classifier, content normalizer and edit buffer
use credit_health_client::content::{self, break_enumerations, normalize, SectionBody};
use credit_health_client::edit_buffer::{ProfileEditBuffer, ProfileField};
use credit_health_client::health::HealthStatus;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

// Property: classification is total and only two exact strings escape `Good`
proptest! {
    #[test]
    fn unrecognised_signals_are_good(signal in "\\PC*") {
        prop_assume!(signal != "Poor" && signal != "Standard");
        prop_assert_eq!(HealthStatus::classify(Some(&json!(signal))), HealthStatus::Good);
        prop_assert_eq!(HealthStatus::classify_str(&signal), HealthStatus::Good);
    }

    #[test]
    fn numeric_signals_are_good(n in any::<i64>(), f in any::<f64>()) {
        prop_assert_eq!(HealthStatus::classify(Some(&json!(n))), HealthStatus::Good);
        prop_assert_eq!(HealthStatus::classify(Some(&json!(f))), HealthStatus::Good);
    }
}

// Property: normalizing a structured mapping is stable and keeps key order
proptest! {
    #[test]
    fn structured_normalization_is_idempotent(
        entries in prop::collection::vec(("[A-Za-z ]{1,12}", "[a-z.\\- ]{0,30}"), 1..8)
    ) {
        let mut map = Map::new();
        for (key, value) in &entries {
            map.insert(key.clone(), Value::String(value.clone()));
        }
        let raw = Value::Object(map.clone());

        let first = normalize(Some(&raw)).unwrap();
        let second = normalize(Some(&raw)).unwrap();
        prop_assert_eq!(&first, &second);

        let titles: Vec<String> = first.iter().map(|s| s.title.clone()).collect();
        let keys: Vec<String> = map.keys().cloned().collect();
        prop_assert_eq!(titles, keys);

        // Structured strings are never rewritten.
        for section in &first {
            prop_assert_eq!(&section.body, &SectionBody::Scalar(map[&section.title].as_str().unwrap().to_string()));
        }
    }

    #[test]
    fn normalize_or_fallback_never_panics(raw in "\\PC*") {
        let sections = content::normalize_or_fallback(Some(&Value::String(raw)));
        prop_assert!(!sections.is_empty());
    }

    #[test]
    fn enumeration_breaks_precede_every_hyphen(parts in prop::collection::vec("[A-Z]{1,3}", 1..6)) {
        let joined = parts.join(".-");
        let expected = parts.join(".\n-");
        prop_assert_eq!(break_enumerations(&joined), expected);
    }
}

// Property: only edited whitelisted fields reach the update
proptest! {
    #[test]
    fn update_contains_only_dirty_persisted_fields(
        picks in prop::collection::btree_set(0usize..14, 0..14),
        value in 0u32..10_000
    ) {
        let mut buffer = ProfileEditBuffer::new();
        for idx in &picks {
            buffer.set(ProfileField::ALL[*idx], value);
        }

        let set = buffer.prepare_update(1).request.update.set;
        let mut expected_len = 0;
        for (idx, field) in ProfileField::ALL.iter().enumerate() {
            if !field.is_persisted() {
                continue;
            }
            let edited = picks.contains(&idx);
            if edited {
                expected_len += 1;
            }
            prop_assert_eq!(set.contains_key(field.column()), edited);
        }
        prop_assert_eq!(set.len(), expected_len);
    }
}

#[test]
fn literal_enumeration_example() {
    let sections = normalize(Some(&json!("{\"Tip\": \"A.-B.-C\"}"))).unwrap();
    assert_eq!(sections[0].body, SectionBody::Scalar("A.\n-B.\n-C".to_string()));
}
