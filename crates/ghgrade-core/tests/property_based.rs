//! Property-based tests using proptest

use ghgrade_core::credentials;
use ghgrade_core::types::owner_handle;
use ghgrade_core::{IdentityMapping, IdentitySource};
use proptest::prelude::*;
use serde_json::{json, Value};

// Generate small JSON credential-like documents
fn arb_document() -> impl Strategy<Value = Value> {
    (
        "[a-z_]{1,20}",
        "[ -~]{0,80}",
        any::<i64>(),
        any::<bool>(),
        any::<f64>().prop_filter("JSON numbers are finite", |f| f.is_finite()),
        prop::collection::vec("[a-zA-Z0-9+/=\n-]{0,40}", 0..4),
    )
        .prop_map(|(kind, text, number, flag, ratio, lines)| {
            json!({
                "type": kind,
                "client_email": text,
                "number": number,
                "enabled": flag,
                "ratio": ratio,
                "private_key": lines.join("\n"),
                "nested": { "lines": lines },
            })
        })
}

proptest! {
    #[test]
    fn test_codec_roundtrip(document in arb_document()) {
        let token = credentials::encode(&document);
        prop_assert_eq!(credentials::decode(&token).unwrap(), document);
    }

    #[test]
    fn test_codec_deterministic(document in arb_document()) {
        prop_assert_eq!(credentials::encode(&document), credentials::encode(&document));
    }

    #[test]
    fn test_decode_never_panics(token in "[ -~]{0,64}") {
        let _ = credentials::decode(&token);
    }

    #[test]
    fn test_lookup_ignores_case(
        username in "[a-zA-Z0-9-]{1,39}",
        eid in "[a-zA-Z]{2,4}[0-9]{2,5}",
    ) {
        let mapping = IdentityMapping::from_pairs(
            IdentitySource::Unavailable,
            [(eid.as_str(), username.as_str())],
        );
        let expected = eid.to_lowercase();
        prop_assert_eq!(mapping.lookup(&username), Some(expected.as_str()));
        prop_assert_eq!(mapping.lookup(&username.to_uppercase()), Some(expected.as_str()));
        prop_assert_eq!(mapping.lookup(&username.to_lowercase()), Some(expected.as_str()));
    }

    #[test]
    fn test_owner_handle_strips_prefix(
        prefix in "[a-zA-Z0-9]{1,10}",
        handle in "[a-zA-Z0-9-]{0,39}",
    ) {
        let name = format!("{}-{}", prefix, handle);
        prop_assert_eq!(owner_handle(&name), handle.to_lowercase());
    }
}
