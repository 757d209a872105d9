use crate::Subject;

use serde::{Deserialize, Serialize};

/// On-disk record shape covering both schema generations.
///
/// The first generation had no `sub` and keyed accounts by `email`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredAccountRecord {
    #[serde(default)]
    pub(crate) email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) uuid: Option<String>,
    #[serde(default)]
    pub(crate) added: Option<String>,
}

/// How a record identifies its account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scheme", content = "sub", rename_all = "snake_case")]
pub enum RecordIdentity {
    /// Token-derived identity; the only form identity checks match against.
    Subject(Subject),
    /// First-generation record keyed by email. Never matched by identity.
    LegacyEmail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountRecord {
    /// Display hint; may be stale or wrong.
    pub email: Option<String>,
    pub identity: RecordIdentity,
    /// `oauthAccount.accountUuid` captured when the account was saved.
    pub uuid: Option<String>,
    pub added: Option<String>,
}

impl AccountRecord {
    pub fn new(sub: Subject, email: String, uuid: Option<String>, added: String) -> Self {
        Self {
            email: Some(email),
            identity: RecordIdentity::Subject(sub),
            uuid,
            added: Some(added),
        }
    }

    pub fn sub(&self) -> Option<&Subject> {
        match &self.identity {
            RecordIdentity::Subject(sub) => Some(sub),
            RecordIdentity::LegacyEmail => None,
        }
    }

    pub fn is_legacy(&self) -> bool {
        self.identity == RecordIdentity::LegacyEmail
    }

    /// Lifts a stored record into the current schema. A blank `sub` counts
    /// as missing.
    pub(crate) fn upgrade(stored: StoredAccountRecord) -> Self {
        let identity = match stored.sub.map(|s| s.trim().to_string()) {
            Some(sub) if !sub.is_empty() => RecordIdentity::Subject(Subject::new(sub)),
            _ => RecordIdentity::LegacyEmail,
        };

        Self {
            email: stored.email,
            identity,
            uuid: stored.uuid,
            added: stored.added,
        }
    }

    pub(crate) fn to_stored(&self) -> StoredAccountRecord {
        StoredAccountRecord {
            email: self.email.clone(),
            sub: self.sub().map(|s| s.as_str().to_string()),
            uuid: self.uuid.clone(),
            added: self.added.clone(),
        }
    }
}
