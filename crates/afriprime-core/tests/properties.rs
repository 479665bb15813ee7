//! Property tests for the verifiers.

use afriprime_core::init_data::sign_init_data;
use afriprime_core::paystack::sign_payload as sign_paystack;
use afriprime_core::{
    DevBypass, InitDataPairs, InitDataVerifier, PaystackVerifier, SecretMaterial, VerifyError,
    WebhookEnvelope, WebhookVerifier,
};
use proptest::prelude::*;

fn field_key() -> impl Strategy<Value = String> {
    "[a-z_]{1,12}".prop_filter("hash is the signature field", |k| k != "hash")
}

fn fields() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map(field_key(), "[ -~]{0,24}", 1..6)
        .prop_map(|m| m.into_iter().collect())
}

fn borrowed(fields: &[(String, String)]) -> Vec<(&str, &str)> {
    fields
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}

proptest! {
    #[test]
    fn signed_init_data_always_verifies(token in "[A-Za-z0-9:_-]{8,46}", fields in fields()) {
        let secret = SecretMaterial::new(token);
        let raw = sign_init_data(&secret, &borrowed(&fields));
        let verifier = InitDataVerifier::new(Some(secret), DevBypass::Disabled);

        prop_assert!(verifier.verify(&raw).is_ok());
    }

    #[test]
    fn verification_is_idempotent(token in "[A-Za-z0-9]{8,32}", fields in fields(), tamper in any::<bool>()) {
        let secret = SecretMaterial::new(token);
        let mut raw = sign_init_data(&secret, &borrowed(&fields));
        if tamper {
            raw.push_str("&extra=1");
        }
        let verifier = InitDataVerifier::new(Some(secret), DevBypass::Disabled);

        prop_assert_eq!(verifier.verify(&raw), verifier.verify(&raw));
    }

    #[test]
    fn changing_any_signed_value_breaks_the_hash(
        token in "[A-Za-z0-9]{8,32}",
        fields in fields(),
        index in any::<prop::sample::Index>(),
    ) {
        let secret = SecretMaterial::new(token);
        let raw = sign_init_data(&secret, &borrowed(&fields));
        let hash = InitDataPairs::parse(&raw).unwrap().hash().unwrap().to_string();

        let mut tampered = fields.clone();
        let i = index.index(tampered.len());
        tampered[i].1.push('x');

        let mut query = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &tampered {
            query.append_pair(k, v);
        }
        query.append_pair("hash", &hash);

        let verifier = InitDataVerifier::new(Some(secret), DevBypass::Disabled);
        prop_assert_eq!(verifier.verify(&query.finish()), Err(VerifyError::InvalidSignature));
    }

    #[test]
    fn reencoding_reproduces_the_check_string(fields in fields()) {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &fields {
            query.append_pair(k, v);
        }
        let parsed = InitDataPairs::parse(&query.finish()).unwrap();
        let reparsed = InitDataPairs::parse(&parsed.to_query_string()).unwrap();

        let mut expected: Vec<String> = fields.iter().map(|(k, v)| format!("{k}={v}")).collect();
        expected.sort();

        prop_assert_eq!(parsed.check_string(), expected.join("\n"));
        prop_assert_eq!(reparsed.check_string(), parsed.check_string());
    }

    #[test]
    fn paystack_accepts_only_the_exact_body(body in prop::collection::vec(any::<u8>(), 0..256), flip in any::<prop::sample::Index>()) {
        let secret = SecretMaterial::new("whsec_test");
        let sig = sign_paystack(&secret, &body);
        let verifier = PaystackVerifier::new(Some(secret), DevBypass::Disabled);

        let mut tampered = body.clone();
        if tampered.is_empty() {
            tampered.push(b' ');
        } else {
            let i = flip.index(tampered.len());
            tampered[i] ^= 0x01;
        }

        prop_assert_eq!(
            verifier.verify(&WebhookEnvelope::new(&tampered, Some(&sig))),
            Err(VerifyError::InvalidSignature)
        );
    }
}
