use crate::identity::token::{decode_claims, extract_tokens};
use crate::{ResolutionStrategy, Subject, mask_token, resolve_identity_from};

use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};

/// Diagnostic view of one credential blob. Tokens appear masked only.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CredentialDebug {
    pub present: bool,
    pub parse_error: Option<String>,
    pub masked_access_token: Option<String>,
    pub masked_id_token: Option<String>,
    pub sub: Option<Subject>,
    pub strategy: Option<ResolutionStrategy>,
    pub email_hint: Option<String>,
    pub access_token_claims: Option<Map<String, Value>>,
    pub id_token_claims: Option<Map<String, Value>>,
}

impl CredentialDebug {
    pub(crate) fn absent() -> Self {
        Self::default()
    }

    pub(crate) fn inspect(text: &str) -> Self {
        let credential = match serde_json::from_str::<Value>(text) {
            Ok(value) => value,
            Err(e) => {
                return Self {
                    present: true,
                    parse_error: Some(e.to_string()),
                    ..Self::default()
                };
            }
        };

        let tokens = extract_tokens(&credential);
        let identity = resolve_identity_from(&credential);

        Self {
            present: true,
            parse_error: None,
            masked_access_token: tokens.access_token.as_deref().map(mask_token),
            masked_id_token: tokens.id_token.as_deref().map(mask_token),
            sub: identity.sub,
            strategy: identity.strategy,
            email_hint: identity.email_hint,
            access_token_claims: tokens.access_token.as_deref().and_then(decode_claims),
            id_token_claims: tokens.id_token.as_deref().and_then(decode_claims),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchivedDebug {
    pub account: u32,
    pub email: Option<String>,
    pub recorded_sub: Option<Subject>,
    /// Archived credential resolves to the recorded sub.
    pub sub_matches: bool,
    pub credential: CredentialDebug,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugSnapshot {
    pub credential_file: PathBuf,
    pub live_config_file: PathBuf,
    pub registry_file: PathBuf,
    pub registry_corruption: Option<String>,
    pub stored_active: Option<u32>,
    pub live_account: Option<u32>,
    pub live: CredentialDebug,
    pub archived: Vec<ArchivedDebug>,
}
