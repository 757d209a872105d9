mod identity;
mod monitor;
mod registry;

use crate::{BlobKind, StoreLayout, SwapEngine};

use std::fs;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Unsigned `header.payload.signature` token carrying `claims`.
pub(crate) fn make_jwt(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// Credential document in the host CLI's shape.
pub(crate) fn credential_json(access_token: &str, refresh_token: &str) -> String {
    serde_json::to_string_pretty(&json!({
        "claudeAiOauth": {
            "accessToken": access_token,
            "refreshToken": refresh_token,
            "expiresAt": 1_900_000_000_000_u64,
            "scopes": ["user:inference"]
        }
    }))
    .unwrap()
}

pub(crate) fn oauth_account(email: &str, uuid: &str) -> Value {
    json!({
        "emailAddress": email,
        "accountUuid": uuid,
        "organizationName": "Personal"
    })
}

/// Isolated home directory with the default layout rooted in it.
pub(crate) struct Fixture {
    pub(crate) temp: TempDir,
    pub(crate) layout: StoreLayout,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let layout = StoreLayout::rooted_at(temp.path());
        Self { temp, layout }
    }

    pub(crate) fn engine(&self) -> SwapEngine {
        SwapEngine::new(self.layout.clone())
    }

    /// Simulates the host CLI logging in as `sub`: writes the live credential
    /// and replaces `oauthAccount` in the primary config, keeping other keys.
    /// Returns the credential text.
    pub(crate) fn login(&self, sub: &str, email: &str) -> String {
        let token = make_jwt(&json!({ "sub": sub, "email": email }));
        let credential = credential_json(&token, &format!("refresh-{sub}"));
        self.write_live_credential(&credential);

        let mut config = self
            .read_live_config()
            .unwrap_or_else(|| json!({ "numStartups": 3, "theme": "dark" }));
        config["oauthAccount"] = oauth_account(email, &format!("uuid-{sub}"));
        self.write_live_config(&config);

        credential
    }

    pub(crate) fn write_live_credential(&self, text: &str) {
        write_file(&self.layout.credential_file, text);
    }

    pub(crate) fn read_live_credential(&self) -> Option<String> {
        fs::read_to_string(&self.layout.credential_file).ok()
    }

    pub(crate) fn write_live_config(&self, config: &Value) {
        write_file(
            &self.layout.config_file,
            &serde_json::to_string_pretty(config).unwrap(),
        );
    }

    pub(crate) fn read_live_config(&self) -> Option<Value> {
        let text = fs::read_to_string(&self.layout.config_file).ok()?;
        serde_json::from_str(&text).ok()
    }

    pub(crate) fn read_registry_json(&self) -> Value {
        let text = fs::read_to_string(self.layout.registry_file()).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    pub(crate) fn write_registry_json(&self, registry: &Value) {
        write_file(
            &self.layout.registry_file(),
            &serde_json::to_string_pretty(registry).unwrap(),
        );
    }

    pub(crate) fn archive_exists(&self, kind: BlobKind, account: u32) -> bool {
        self.layout.archive_path(kind, account).is_file()
    }
}

pub(crate) fn write_file(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}
