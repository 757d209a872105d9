//! Save and switch: the only code that changes which account is live.

pub(crate) mod debug_snapshot;
pub(crate) mod reports;

use crate::blob_store::{OAUTH_ACCOUNT_KEY, oauth_account};
use crate::identity::token::extract_tokens;
use crate::maintenance::cleanup::remove_orphans;
use crate::maintenance::migration::migrate_archive_names;
use crate::swap::debug_snapshot::{ArchivedDebug, CredentialDebug};
use crate::{
    AccountSummary, ActiveSource, BlobKind, BlobStore, CleanupReport, DebugSnapshot,
    MigrationReport, Outcome, Registry, ResolvedIdentity, StatusReport, StoreLayout,
    SwapError, SwapLock, SwapResult, SwitchReport, mask_token, resolve_identity,
    resolve_identity_from,
};

use log::{debug, info, warn};
use serde_json::Value;

const UNKNOWN_EMAIL: &str = "unknown";
const CONFIG_EMAIL_KEY: &str = "emailAddress";
const CONFIG_UUID_KEY: &str = "accountUuid";

/// The live credential and the account it belongs to, if any.
struct LiveAccount {
    identity: Option<ResolvedIdentity>,
    account: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SwapEngine {
    store: BlobStore,
    use_lock: bool,
}

impl SwapEngine {
    pub fn new(layout: StoreLayout) -> Self {
        Self {
            store: BlobStore::new(layout),
            use_lock: true,
        }
    }

    /// Whether save, switch and migrate hold the swap lock while running.
    pub fn with_lock(mut self, use_lock: bool) -> Self {
        self.use_lock = use_lock;
        self
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    pub fn layout(&self) -> &StoreLayout {
        self.store.layout()
    }

    /// Archives the live account under a new number and makes it active.
    ///
    /// Nothing is written unless every precondition holds. Numbers that
    /// still have archives on disk are skipped even when the registry has
    /// forgotten them.
    pub fn save_current(&self) -> SwapResult<Outcome<u32>> {
        let _lock = self.lock()?;
        let layout = self.layout();

        let credential_text = self
            .store
            .read_live(BlobKind::Credential)
            .ok_or_else(|| SwapError::no_credential(layout.credential_file.clone()))?;
        let credential = serde_json::from_str::<Value>(&credential_text)
            .map_err(|e| SwapError::malformed_credential(e.to_string()))?;

        let identity = resolve_identity_from(&credential);
        let sub = identity.sub.clone().ok_or_else(SwapError::no_token)?;

        let mut registry = Registry::init_if_absent(&layout.registry_file())?;
        if let Some(existing) = registry.is_known_identity(&sub) {
            return Err(SwapError::identity_already_saved(existing));
        }

        let config_path = self.store.live_config_path();
        let config_text = self
            .store
            .read_live(BlobKind::Config)
            .ok_or_else(|| SwapError::no_config(config_path.clone()))?;
        let config = serde_json::from_str::<Value>(&config_text)
            .ok()
            .filter(Value::is_object)
            .ok_or_else(|| SwapError::no_config(config_path.clone()))?;

        if let Some(highest) = self.store.archived_account_numbers().last() {
            registry.reserve_through(*highest);
        }
        let account = registry.next_account_number()?;
        let mut non_fatal = self
            .store
            .write_archived(BlobKind::Credential, account, &credential_text)?;
        non_fatal.extend(
            self.store
                .write_archived(BlobKind::Config, account, &config_text)?,
        );

        let email = identity
            .email_hint
            .or_else(|| config_field(&config, CONFIG_EMAIL_KEY))
            .unwrap_or_else(|| UNKNOWN_EMAIL.to_string());
        let uuid = config_field(&config, CONFIG_UUID_KEY);

        let recorded = registry.record_account(sub, email.clone(), uuid)?;
        debug_assert_eq!(recorded, account);
        non_fatal.extend(registry.save(&layout.registry_file())?);

        info!("Saved current account as Account-{account} ({email})");
        Ok(Outcome::new(account, non_fatal))
    }

    /// Parks the live account and installs Account-`account`.
    ///
    /// The target's backups and the live config are checked before anything
    /// is touched, so a missing or damaged file leaves live files and
    /// registry unchanged.
    pub fn switch_to(&self, account: u32) -> SwapResult<Outcome<SwitchReport>> {
        let _lock = self.lock()?;
        let layout = self.layout();
        let registry_path = layout.registry_file();

        let mut registry = Registry::init_if_absent(&registry_path)?;
        if !registry.contains(account) {
            return Err(SwapError::account_not_found(account));
        }
        self.read_target(account)?;
        let mut live_config = self
            .store
            .read_live_config()?
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));

        let mut non_fatal = Vec::new();
        let live = self.live_account(&registry);
        let (previous_account, previous_source) = match live.account {
            Some(current) => (Some(current), ActiveSource::LiveCredential),
            None if live.identity.is_none() => match registry.active_account_number() {
                Some(pointer) => (Some(pointer), ActiveSource::StoredPointer),
                None => (None, ActiveSource::Unknown),
            },
            None => {
                warn!("Live credential does not belong to any saved account; not archiving it");
                (None, ActiveSource::Unknown)
            }
        };

        let mut archived = Vec::new();
        if let Some(current) = previous_account {
            for kind in BlobKind::ALL {
                if let Some(text) = self.store.read_live(kind) {
                    non_fatal.extend(self.store.write_archived(kind, current, &text)?);
                    archived.push(kind);
                }
            }
            debug!("Archived live blobs under Account-{current}: {archived:?}");
        }

        let (credential_text, target_oauth) = self.read_target(account)?;

        if let Some(doc) = live_config.as_object_mut() {
            doc.insert(OAUTH_ACCOUNT_KEY.to_string(), target_oauth);
        }
        let config_text = serde_json::to_string_pretty(&live_config)?;

        non_fatal.extend(
            self.store
                .write_live(BlobKind::Credential, &credential_text)?,
        );
        non_fatal.extend(self.store.write_live(BlobKind::Config, &config_text)?);

        registry.set_active(account)?;
        non_fatal.extend(registry.save(&registry_path)?);

        let cleanup = remove_orphans(&self.store, &registry);
        non_fatal.extend(cleanup.non_fatal);

        let email = registry.get(account).and_then(|r| r.email.clone());
        info!(
            "Switched to Account-{account} ({})",
            email.as_deref().unwrap_or(UNKNOWN_EMAIL)
        );

        Ok(Outcome::new(
            SwitchReport {
                account,
                email,
                previous_account,
                previous_source,
                archived,
                removed_orphans: cleanup.value.removed,
            },
            non_fatal,
        ))
    }

    /// Saved accounts in save order.
    pub fn list_accounts(&self) -> SwapResult<Vec<AccountSummary>> {
        let registry = self.read_registry()?;
        let live = self.live_account(&registry);
        let active = live.account.or(if live.identity.is_none() {
            registry.active_account_number()
        } else {
            None
        });

        Ok(registry
            .records()
            .map(|(account, record)| AccountSummary {
                account,
                email: record.email.clone(),
                has_sub: record.sub().is_some(),
                uuid: record.uuid.clone(),
                added: record.added.clone(),
                is_active: active == Some(account),
                has_credential_backup: self.store.has_archived(BlobKind::Credential, account),
                has_config_backup: self.store.has_archived(BlobKind::Config, account),
            })
            .collect())
    }

    pub fn status(&self) -> SwapResult<StatusReport> {
        let registry = self.read_registry()?;
        let live = self.live_account(&registry);
        let stored_active = registry.active_account_number();

        let masked_token = self
            .live_access_token()
            .as_deref()
            .map(mask_token);
        let identity = live.identity.unwrap_or_default();
        let pointer_stale = identity.sub.is_some() && live.account != stored_active;

        Ok(StatusReport {
            live_account: live.account,
            stored_active,
            pointer_stale,
            live_sub: identity.sub,
            strategy: identity.strategy,
            masked_token,
            email_hint: identity.email_hint,
            account_count: registry.len(),
        })
    }

    /// Masked diagnostics for the live credential and every archive.
    pub fn debug_snapshot(&self) -> SwapResult<DebugSnapshot> {
        let layout = self.layout();
        let loaded = Registry::load(&layout.registry_file())?;
        let registry_corruption = loaded.corruption_error;
        let registry = loaded.registry.unwrap_or_default();
        let live_account = self.live_account(&registry).account;

        let live = self
            .store
            .read_live(BlobKind::Credential)
            .map(|text| CredentialDebug::inspect(&text))
            .unwrap_or_else(CredentialDebug::absent);

        let archived = registry
            .records()
            .map(|(account, record)| {
                let credential = self
                    .store
                    .read_archived(BlobKind::Credential, account)
                    .map(|text| CredentialDebug::inspect(&text))
                    .unwrap_or_else(CredentialDebug::absent);
                let recorded_sub = record.sub().cloned();
                ArchivedDebug {
                    account,
                    email: record.email.clone(),
                    sub_matches: recorded_sub.is_some() && credential.sub == recorded_sub,
                    recorded_sub,
                    credential,
                }
            })
            .collect();

        Ok(DebugSnapshot {
            credential_file: layout.credential_file.clone(),
            live_config_file: self.store.live_config_path(),
            registry_file: layout.registry_file(),
            registry_corruption,
            stored_active: registry.active_account_number(),
            live_account,
            live,
            archived,
        })
    }

    /// Renames legacy email-keyed archives to number-only names.
    pub fn migrate(&self) -> SwapResult<Outcome<MigrationReport>> {
        let _lock = self.lock()?;
        let Some(registry) = Registry::load(&self.layout().registry_file())?.registry else {
            debug!("No readable registry; nothing to migrate");
            return Ok(Outcome::clean(MigrationReport::default()));
        };
        Ok(migrate_archive_names(&self.store, &registry))
    }

    /// Removes archives for numbers the registry does not know.
    ///
    /// Without a readable registry every archive would look orphaned, so
    /// nothing is removed in that case, nor while a corrupted registry
    /// backup is still waiting to be repaired.
    pub fn cleanup_orphans(&self) -> SwapResult<Outcome<CleanupReport>> {
        let Some(registry) = Registry::load(&self.layout().registry_file())?.registry else {
            warn!("No readable registry; skipping orphan cleanup");
            return Ok(Outcome::clean(CleanupReport::default()));
        };
        Ok(remove_orphans(&self.store, &registry))
    }

    /// Raw live access token, for collaborators that need the bearer.
    pub(crate) fn live_access_token(&self) -> Option<String> {
        let text = self.store.read_live(BlobKind::Credential)?;
        let credential = serde_json::from_str::<Value>(&text).ok()?;
        extract_tokens(&credential).access_token
    }

    fn lock(&self) -> SwapResult<Option<SwapLock>> {
        if !self.use_lock {
            return Ok(None);
        }
        SwapLock::acquire(&self.layout().lock_file()).map(Some)
    }

    /// Registry for read-only views; an unreadable one reads as empty.
    fn read_registry(&self) -> SwapResult<Registry> {
        let loaded = Registry::load(&self.layout().registry_file())?;
        if let Some(error) = loaded.corruption_error {
            warn!("Registry unreadable, showing no accounts: {error}");
        }
        Ok(loaded.registry.unwrap_or_default())
    }

    /// Resolves the live credential and matches it against records by sub.
    ///
    /// `identity` is `None` only when no live credential text is readable.
    fn live_account(&self, registry: &Registry) -> LiveAccount {
        let Some(text) = self.store.read_live(BlobKind::Credential) else {
            return LiveAccount {
                identity: None,
                account: None,
            };
        };

        let identity = resolve_identity(&text);
        let account = identity
            .sub
            .as_ref()
            .and_then(|sub| registry.is_known_identity(sub));
        LiveAccount {
            identity: Some(identity),
            account,
        }
    }

    /// Archived credential text and `oauthAccount` value for `account`.
    fn read_target(&self, account: u32) -> SwapResult<(String, Value)> {
        let credential = self
            .store
            .read_archived(BlobKind::Credential, account)
            .ok_or_else(|| SwapError::missing_backup(account, BlobKind::Credential))?;
        let config_text = self
            .store
            .read_archived(BlobKind::Config, account)
            .ok_or_else(|| SwapError::missing_backup(account, BlobKind::Config))?;

        let config = serde_json::from_str::<Value>(&config_text)
            .map_err(|e| SwapError::invalid_backup_config(account, e.to_string()))?;
        let oauth = oauth_account(&config)
            .cloned()
            .ok_or_else(|| {
                SwapError::invalid_backup_config(account, "no oauthAccount object")
            })?;

        Ok((credential, oauth))
    }
}

fn config_field(config: &Value, key: &str) -> Option<String> {
    oauth_account(config)?
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}
