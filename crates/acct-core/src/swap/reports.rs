use crate::{BlobKind, ResolutionStrategy, Subject};

use std::path::PathBuf;

use serde::Serialize;

/// How the account being switched away from was identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveSource {
    /// The live credential's identity matched a record.
    LiveCredential,
    /// No live credential was readable; the stored pointer was used.
    StoredPointer,
    /// Nothing identified the live account, so nothing was archived.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchReport {
    pub account: u32,
    pub email: Option<String>,
    pub previous_account: Option<u32>,
    pub previous_source: ActiveSource,
    /// Live blobs archived under `previous_account` before the switch.
    pub archived: Vec<BlobKind>,
    pub removed_orphans: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub account: u32,
    pub email: Option<String>,
    pub has_sub: bool,
    pub uuid: Option<String>,
    pub added: Option<String>,
    pub is_active: bool,
    pub has_credential_backup: bool,
    pub has_config_backup: bool,
}

/// Live-versus-stored view of the active account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatusReport {
    /// Account whose recorded sub matches the live credential.
    pub live_account: Option<u32>,
    pub stored_active: Option<u32>,
    /// Stored pointer disagrees with the live credential.
    pub pointer_stale: bool,
    pub live_sub: Option<Subject>,
    pub strategy: Option<ResolutionStrategy>,
    pub masked_token: Option<String>,
    pub email_hint: Option<String>,
    pub account_count: usize,
}
