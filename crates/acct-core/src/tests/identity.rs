use crate::identity::FINGERPRINT_PREFIX;
use crate::tests::{credential_json, make_jwt};
use crate::{
    ResolutionStrategy, Subject, decode_claims, extract_tokens, fingerprint, mask_token,
    resolve_identity, resolve_subject,
};

use googletest::assert_that;
use googletest::prelude::{anything, eq, none, some};
use proptest::prelude::*;
use serde_json::json;

#[test]
fn given_signed_token_with_sub_when_resolve_then_sub_claim_is_identity() {
    let token = make_jwt(&json!({ "sub": "user-123", "email": "a@example.com" }));

    let identity = resolve_identity(&credential_json(&token, "r"));

    assert_eq!(identity.sub, Some(Subject::new("user-123")));
    assert_eq!(identity.strategy, Some(ResolutionStrategy::TokenSubject));
    assert!(identity.has_access_token);
    assert!(!identity.sub.unwrap().is_fingerprint());
}

#[test]
fn given_opaque_token_when_resolve_then_prefixed_fingerprint() {
    let identity = resolve_identity(&credential_json("sk-ant-REDACTED", "r"));

    let sub = identity.sub.unwrap();
    assert!(sub.is_fingerprint());
    assert_that!(sub.as_str().len(), eq(FINGERPRINT_PREFIX.len() + 32));
    assert_eq!(identity.strategy, Some(ResolutionStrategy::Fingerprint));
}

#[test]
fn given_signed_token_without_sub_when_resolve_then_falls_back_to_fingerprint() {
    let token = make_jwt(&json!({ "email": "nosub@example.com" }));

    let (sub, strategy) = resolve_subject(&token).unwrap();

    assert_eq!(sub, fingerprint(&token));
    assert_eq!(strategy, ResolutionStrategy::Fingerprint);
}

#[test]
fn given_blank_sub_claim_when_resolve_then_falls_back_to_fingerprint() {
    let token = make_jwt(&json!({ "sub": "   " }));

    let (_, strategy) = resolve_subject(&token).unwrap();

    assert_eq!(strategy, ResolutionStrategy::Fingerprint);
}

#[test]
fn given_credential_without_access_token_when_resolve_then_no_sub_but_email_hint() {
    let id_token = make_jwt(&json!({ "sub": "ignored", "email": "hint@example.com" }));
    let text = json!({ "claudeAiOauth": { "idToken": id_token } }).to_string();

    let identity = resolve_identity(&text);

    assert_that!(identity.sub, none());
    assert!(!identity.has_access_token);
    assert_eq!(identity.email_hint.as_deref(), Some("hint@example.com"));
}

#[test]
fn given_id_and_access_token_emails_when_resolve_then_id_token_email_wins() {
    let access = make_jwt(&json!({ "sub": "s", "email": "access@example.com" }));
    let id = make_jwt(&json!({ "email_address": "id@example.com" }));
    let text = json!({ "tokens": { "access_token": access, "id_token": id } }).to_string();

    let identity = resolve_identity(&text);

    assert_eq!(identity.sub, Some(Subject::new("s")));
    assert_eq!(identity.email_hint.as_deref(), Some("id@example.com"));
}

#[test]
fn given_non_json_text_when_resolve_then_nothing_resolved() {
    let identity = resolve_identity("not json at all");

    assert_that!(identity.sub, none());
    assert_that!(identity.email_hint, none());
    assert!(!identity.has_access_token);
}

#[test]
fn given_token_at_document_root_when_extract_then_found() {
    let credential = json!({ "accessToken": "root-token" });

    let tokens = extract_tokens(&credential);

    assert_eq!(tokens.access_token.as_deref(), Some("root-token"));
    assert_that!(tokens.id_token, none());
}

#[test]
fn given_two_part_or_bad_payload_token_when_decode_claims_then_none() {
    assert_that!(decode_claims("header.payload"), none());
    assert_that!(decode_claims("a.b.c.d"), none());
    assert_that!(decode_claims("aGVhZGVy.!!!.sig"), none());
    assert_that!(decode_claims(&make_jwt(&json!({ "sub": "x" }))), some(anything()));
}

#[test]
fn given_long_token_when_mask_then_head_and_tail_only() {
    let masked = mask_token("sk-ant-REDACTED");

    assert_that!(masked.as_str(), eq("sk-ant-o...WXYZ"));
}

#[test]
fn given_short_token_when_mask_then_fully_hidden() {
    assert_that!(mask_token("abc123").as_str(), eq("****"));
    assert_that!(mask_token("").as_str(), eq("****"));
}

proptest! {
    #[test]
    fn fingerprint_is_stable_for_same_opaque_token(token in "[A-Za-z0-9_-]{1,80}") {
        let first = resolve_identity(&credential_json(&token, "r1")).sub;
        let second = resolve_identity(&credential_json(&token, "r2")).sub;

        prop_assert!(first.is_some());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn distinct_opaque_tokens_get_distinct_fingerprints(
        a in "[A-Za-z0-9]{8,64}",
        b in "[A-Za-z0-9]{8,64}",
    ) {
        prop_assume!(a != b);
        prop_assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn masked_token_keeps_only_head_and_tail(token in "[A-Za-z0-9]{13,64}") {
        let masked = mask_token(&token);

        prop_assert_eq!(masked.len(), 15);
        prop_assert!(masked.starts_with(&token[..8]));
        prop_assert!(masked.ends_with(&token[token.len() - 4..]));
    }
}
