pub(crate) mod archive_name;
pub(crate) mod blob_kind;
pub(crate) mod fs_util;
pub(crate) mod store_layout;

use crate::blob_store::archive_name::parse_account_number;
use crate::blob_store::fs_util::{read_text, write_atomic, write_private};
use crate::{BlobKind, NonFatal, StoreLayout, SwapError, SwapResult};

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use log::{debug, warn};
use serde_json::Value;

pub(crate) const OAUTH_ACCOUNT_KEY: &str = "oauthAccount";

/// Raw access to the live slot and the per-account archive.
///
/// Reads never fail: a missing, unreadable or undecodable blob is `None`
/// ("not configured yet"). Writes restrict permissions best-effort and
/// report failures to do so as [`NonFatal`] values.
#[derive(Debug, Clone)]
pub struct BlobStore {
    layout: StoreLayout,
}

impl BlobStore {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// The live config path currently in effect.
    ///
    /// The primary path wins only when it already holds identity data;
    /// otherwise the fallback path is the live config.
    pub fn live_config_path(&self) -> PathBuf {
        let primary_has_identity = read_text(&self.layout.config_file)
            .and_then(|text| serde_json::from_str::<Value>(&text).ok())
            .is_some_and(|doc| oauth_account(&doc).is_some());

        if primary_has_identity {
            self.layout.config_file.clone()
        } else {
            self.layout.fallback_config_file.clone()
        }
    }

    pub fn live_path(&self, kind: BlobKind) -> PathBuf {
        match kind {
            BlobKind::Credential => self.layout.credential_file.clone(),
            BlobKind::Config => self.live_config_path(),
        }
    }

    pub fn read_live(&self, kind: BlobKind) -> Option<String> {
        read_text(&self.live_path(kind))
    }

    /// The live config parsed as a JSON object, `None` when there is none.
    ///
    /// A config that exists but is not a JSON object is an error, so it is
    /// never replaced wholesale.
    pub fn read_live_config(&self) -> SwapResult<Option<Value>> {
        let Some(text) = self.read_live(BlobKind::Config) else {
            return Ok(None);
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(doc) if doc.is_object() => Ok(Some(doc)),
            Ok(_) => Err(SwapError::malformed_config(
                self.live_config_path(),
                "top level is not an object",
            )),
            Err(e) => Err(SwapError::malformed_config(
                self.live_config_path(),
                e.to_string(),
            )),
        }
    }

    pub fn write_live(&self, kind: BlobKind, text: &str) -> SwapResult<Vec<NonFatal>> {
        let path = self.live_path(kind);
        debug!("Writing live {kind} to {}", path.display());
        write_atomic(&path, text.as_bytes())
    }

    /// Numbers encoded in archive file names of either scheme, whether or
    /// not the registry knows them.
    pub fn archived_account_numbers(&self) -> BTreeSet<u32> {
        let mut numbers = BTreeSet::new();
        for kind in BlobKind::ALL {
            let dir = self.layout.archive_dir(kind);
            let Ok(entries) = fs::read_dir(&dir) else {
                if dir.exists() {
                    warn!("Cannot list archive dir {}", dir.display());
                }
                continue;
            };
            numbers.extend(entries.flatten().filter_map(|entry| {
                parse_account_number(kind, &entry.file_name().to_string_lossy())
            }));
        }
        numbers
    }

    pub fn has_archived(&self, kind: BlobKind, account: u32) -> bool {
        self.layout.archive_path(kind, account).is_file()
    }

    /// Archived blob text; credential archives are base64-decoded and a
    /// decode failure reads as absent.
    pub fn read_archived(&self, kind: BlobKind, account: u32) -> Option<String> {
        let path = self.layout.archive_path(kind, account);
        let stored = read_text(&path)?;

        match kind {
            BlobKind::Config => Some(stored),
            BlobKind::Credential => {
                let decoded = STANDARD
                    .decode(stored.trim())
                    .ok()
                    .and_then(|bytes| String::from_utf8(bytes).ok());
                if decoded.is_none() {
                    debug!("Archived credential {} does not decode", path.display());
                }
                decoded
            }
        }
    }

    pub fn write_archived(
        &self,
        kind: BlobKind,
        account: u32,
        text: &str,
    ) -> SwapResult<Vec<NonFatal>> {
        let path = self.layout.archive_path(kind, account);
        debug!("Archiving {kind} for Account-{account} to {}", path.display());

        match kind {
            BlobKind::Credential => write_private(&path, STANDARD.encode(text).as_bytes()),
            BlobKind::Config => write_private(&path, text.as_bytes()),
        }
    }
}

/// The `oauthAccount` object of a config document, if present.
pub(crate) fn oauth_account(config: &Value) -> Option<&Value> {
    config.get(OAUTH_ACCOUNT_KEY).filter(|v| v.is_object())
}
