use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Map, Value};

const OAUTH_OBJECT_KEYS: [&str; 2] = ["claudeAiOauth", "tokens"];
const ACCESS_TOKEN_KEYS: [&str; 2] = ["accessToken", "access_token"];
const ID_TOKEN_KEYS: [&str; 2] = ["idToken", "id_token"];

/// Bearer tokens found in a credential document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CredentialTokens {
    pub access_token: Option<String>,
    pub id_token: Option<String>,
}

/// Pulls the tokens out of the credential's OAuth sub-object.
///
/// The well-known sub-object keys are tried first; otherwise the first
/// top-level object carrying an access token is used, and finally the
/// document root itself.
pub fn extract_tokens(credential: &Value) -> CredentialTokens {
    let Some(root) = credential.as_object() else {
        return CredentialTokens::default();
    };

    let oauth = OAUTH_OBJECT_KEYS
        .iter()
        .filter_map(|key| root.get(*key).and_then(Value::as_object))
        .chain(root.values().filter_map(Value::as_object))
        .find(|candidate| read_non_empty(candidate, &ACCESS_TOKEN_KEYS).is_some())
        .unwrap_or(root);

    CredentialTokens {
        access_token: read_non_empty(oauth, &ACCESS_TOKEN_KEYS),
        id_token: read_non_empty(oauth, &ID_TOKEN_KEYS),
    }
}

/// Payload claims of a `header.payload.signature` token. The signature is
/// not verified: the claims are only used to tell accounts apart.
pub fn decode_claims(token: &str) -> Option<Map<String, Value>> {
    let mut parts = token.trim().split('.');
    let (Some(header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };
    if header.is_empty() || payload.is_empty() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(claims) => Some(claims),
        _ => None,
    }
}

pub(crate) fn read_non_empty(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(ToString::to_string)
}
