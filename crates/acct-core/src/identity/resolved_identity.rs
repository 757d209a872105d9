use crate::identity::FINGERPRINT_PREFIX;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Authoritative account identity: a token `sub` claim or a token fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(String);

impl Subject {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when derived from an opaque token rather than a `sub` claim.
    pub fn is_fingerprint(&self) -> bool {
        self.0.starts_with(FINGERPRINT_PREFIX)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which resolver in the chain produced a [`Subject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    TokenSubject,
    Fingerprint,
}

/// Everything derived from one credential blob.
///
/// `email_hint` is for display only and never takes part in matching.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedIdentity {
    pub sub: Option<Subject>,
    pub strategy: Option<ResolutionStrategy>,
    pub email_hint: Option<String>,
    pub has_access_token: bool,
}
