//! Identity resolution from credential blobs.
//!
//! A credential's identity is derived from its access token by an ordered
//! chain of resolvers; the first one that succeeds wins:
//!
//! 1. `sub` claim of a decodable `header.payload.signature` token
//! 2. SHA-256 fingerprint of the raw token bytes (opaque tokens)
//!
//! Everything here is pure: no I/O, no hidden state.

pub(crate) mod mask;
pub(crate) mod resolved_identity;
pub(crate) mod token;

use crate::identity::token::{CredentialTokens, decode_claims, extract_tokens, read_non_empty};
use crate::{ResolutionStrategy, ResolvedIdentity, Subject};

use serde_json::Value;
use sha2::{Digest, Sha256};

pub(crate) const FINGERPRINT_PREFIX: &str = "fp-sha256:";
const FINGERPRINT_HEX_LEN: usize = 32;
const EMAIL_CLAIM_KEYS: [&str; 2] = ["email", "email_address"];

type SubjectResolver = fn(&str) -> Option<Subject>;

const RESOLVER_CHAIN: [(ResolutionStrategy, SubjectResolver); 2] = [
    (ResolutionStrategy::TokenSubject, subject_from_claims),
    (ResolutionStrategy::Fingerprint, subject_from_fingerprint),
];

/// Resolves identity from raw credential text.
///
/// Text that is not JSON resolves to nothing; callers that need to tell
/// "malformed" apart from "no token" parse the text themselves first.
pub fn resolve_identity(credential_text: &str) -> ResolvedIdentity {
    match serde_json::from_str::<Value>(credential_text) {
        Ok(credential) => resolve_identity_from(&credential),
        Err(_) => ResolvedIdentity::default(),
    }
}

pub fn resolve_identity_from(credential: &Value) -> ResolvedIdentity {
    let tokens = extract_tokens(credential);
    let email_hint = email_hint(&tokens);

    let Some(access_token) = tokens.access_token.as_deref() else {
        return ResolvedIdentity {
            email_hint,
            ..ResolvedIdentity::default()
        };
    };

    let resolved = resolve_subject(access_token);
    ResolvedIdentity {
        sub: resolved.as_ref().map(|(sub, _)| sub.clone()),
        strategy: resolved.map(|(_, strategy)| strategy),
        email_hint,
        has_access_token: true,
    }
}

/// Runs the resolver chain over one access token.
pub fn resolve_subject(access_token: &str) -> Option<(Subject, ResolutionStrategy)> {
    let token = access_token.trim();
    if token.is_empty() {
        return None;
    }

    RESOLVER_CHAIN
        .iter()
        .find_map(|(strategy, resolver)| resolver(token).map(|sub| (sub, *strategy)))
}

/// Stable synthetic identity for an opaque token.
pub fn fingerprint(token: &str) -> Subject {
    let digest = Sha256::digest(token.as_bytes());
    let hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
    Subject::new(format!("{FINGERPRINT_PREFIX}{}", &hex[..FINGERPRINT_HEX_LEN]))
}

fn subject_from_claims(token: &str) -> Option<Subject> {
    let claims = decode_claims(token)?;
    read_non_empty(&claims, &["sub"]).map(Subject::new)
}

fn subject_from_fingerprint(token: &str) -> Option<Subject> {
    Some(fingerprint(token))
}

/// Display-only email: identity token claim first, then access token claim.
fn email_hint(tokens: &CredentialTokens) -> Option<String> {
    [tokens.id_token.as_deref(), tokens.access_token.as_deref()]
        .into_iter()
        .flatten()
        .filter_map(decode_claims)
        .find_map(|claims| read_non_empty(&claims, &EMAIL_CLAIM_KEYS))
}
