pub(crate) mod account_record;
pub(crate) mod load_result;

use crate::blob_store::fs_util::write_atomic;
use crate::registry::account_record::StoredAccountRecord;
use crate::{AccountRecord, LoadResult, NonFatal, Subject, SwapError, SwapResult};

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y%m%d_%H%M%S";
const CORRUPTED_MARKER: &str = ".corrupted.";

/// The registry document exactly as it sits on disk.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryDocument {
    #[serde(default)]
    active_account_number: Option<u32>,
    #[serde(default)]
    sequence: Vec<u32>,
    #[serde(default)]
    accounts: BTreeMap<String, StoredAccountRecord>,
    #[serde(default)]
    last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    highest_assigned: Option<u32>,
}

/// Known accounts, their order, and which one is believed live.
///
/// Invariants held after [`Registry::load`] and every mutation:
/// - `sequence` and the keys of `accounts` contain the same numbers
/// - `active_account_number`, when set, names a key of `accounts`
/// - account numbers are never reused (`highest_assigned` only grows)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Registry {
    active_account_number: Option<u32>,
    sequence: Vec<u32>,
    accounts: BTreeMap<u32, AccountRecord>,
    last_updated: Option<String>,
    highest_assigned: u32,
}

impl Registry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads the registry at `path`.
    ///
    /// Returns:
    /// - `Ok(LoadResult { registry: Some(...), corruption_error: None })` - loaded
    /// - `Ok(LoadResult { registry: None, corruption_error: None })` - no file yet
    /// - `Ok(LoadResult { registry: None, corruption_error: Some(...) })` - file exists but does not parse
    pub fn load(path: &Path) -> SwapResult<LoadResult> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                debug!("No registry at {} yet", path.display());
                return Ok(LoadResult::absent());
            }
            Err(e) => return Err(SwapError::io(path.to_path_buf(), e)),
        };

        let contents = contents.strip_prefix('\u{feff}').unwrap_or(&contents);
        match serde_json::from_str::<RegistryDocument>(contents) {
            Ok(document) => {
                let registry = Self::from_document(document);
                debug!(
                    "Loaded registry with {} account(s), active {:?}",
                    registry.accounts.len(),
                    registry.active_account_number
                );
                Ok(LoadResult {
                    registry: Some(registry),
                    corruption_error: None,
                })
            }
            Err(e) => {
                warn!("Registry corrupted at {}: {e}", path.display());
                Ok(LoadResult {
                    registry: None,
                    corruption_error: Some(e.to_string()),
                })
            }
        }
    }

    /// Loads the registry, or starts an empty one when there is none.
    ///
    /// A corrupted file is moved aside first; nothing is written here.
    pub fn init_if_absent(path: &Path) -> SwapResult<Self> {
        let loaded = Self::load(path)?;
        if let Some(registry) = loaded.registry {
            return Ok(registry);
        }

        if loaded.corruption_error.is_some() {
            Self::backup_corrupted(path)?;
        }
        Ok(Self::empty())
    }

    /// Renames `sequence.json` to `sequence.json.corrupted.{timestamp}`.
    pub fn backup_corrupted(path: &Path) -> SwapResult<Option<PathBuf>> {
        if !path.exists() {
            return Ok(None);
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let timestamp = chrono::Utc::now().format(DATE_FORMAT);
        let backup_path = path.with_file_name(format!("{file_name}{CORRUPTED_MARKER}{timestamp}"));

        fs::rename(path, &backup_path)
            .map_err(|e| SwapError::atomic_rename(path.to_path_buf(), backup_path.clone(), e))?;

        warn!("Backed up corrupted registry to {}", backup_path.display());
        Ok(Some(backup_path))
    }

    /// Corrupted registries moved aside next to `path`, oldest first.
    ///
    /// While any exist the live registry may be missing accounts whose
    /// archives are still on disk.
    pub fn corrupted_backups(path: &Path) -> Vec<PathBuf> {
        let (Some(dir), Some(file_name)) = (path.parent(), path.file_name()) else {
            return Vec::new();
        };
        let prefix = format!("{}{CORRUPTED_MARKER}", file_name.to_string_lossy());

        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut backups: Vec<PathBuf> = entries
            .flatten()
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
            .map(|entry| entry.path())
            .collect();
        backups.sort();
        backups
    }

    /// Persists the whole document with write-to-temp-then-rename.
    pub fn save(&mut self, path: &Path) -> SwapResult<Vec<NonFatal>> {
        self.last_updated = Some(chrono::Utc::now().to_rfc3339());

        let json = serde_json::to_string_pretty(&self.to_document())?;
        let non_fatal = write_atomic(path, json.as_bytes())?;

        info!(
            "Saved registry: {} account(s), active {:?}",
            self.accounts.len(),
            self.active_account_number
        );
        Ok(non_fatal)
    }

    pub fn active_account_number(&self) -> Option<u32> {
        self.active_account_number
    }

    pub fn sequence(&self) -> &[u32] {
        &self.sequence
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.last_updated.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn contains(&self, account: u32) -> bool {
        self.accounts.contains_key(&account)
    }

    pub fn get(&self, account: u32) -> Option<&AccountRecord> {
        self.accounts.get(&account)
    }

    /// Records in `sequence` order.
    pub fn records(&self) -> impl Iterator<Item = (u32, &AccountRecord)> {
        self.sequence
            .iter()
            .filter_map(|n| self.accounts.get(n).map(|record| (*n, record)))
    }

    /// Account number whose recorded `sub` equals `sub`.
    ///
    /// Legacy email-keyed records never match.
    pub fn is_known_identity(&self, sub: &Subject) -> Option<u32> {
        self.accounts
            .iter()
            .find(|(_, record)| record.sub() == Some(sub))
            .map(|(n, _)| *n)
    }

    /// One more than the largest number ever assigned, or 1 when empty.
    pub fn next_account_number(&self) -> SwapResult<u32> {
        let max_existing = self.accounts.keys().next_back().copied().unwrap_or(0);
        max_existing
            .max(self.highest_assigned)
            .checked_add(1)
            .ok_or_else(SwapError::account_numbers_exhausted)
    }

    /// Marks every number up to `account` as assigned, so numbers still
    /// in use on disk are never handed out again.
    pub fn reserve_through(&mut self, account: u32) {
        if account > self.highest_assigned {
            debug!("Reserving account numbers through {account}");
            self.highest_assigned = account;
        }
    }

    /// Inserts a new record and makes it active. Does not persist.
    pub fn record_account(
        &mut self,
        sub: Subject,
        email_hint: String,
        uuid: Option<String>,
    ) -> SwapResult<u32> {
        let account = self.next_account_number()?;
        let record = AccountRecord::new(sub, email_hint, uuid, chrono::Utc::now().to_rfc3339());

        self.accounts.insert(account, record);
        self.sequence.push(account);
        self.active_account_number = Some(account);
        self.highest_assigned = account;
        Ok(account)
    }

    pub fn set_active(&mut self, account: u32) -> SwapResult<()> {
        if !self.contains(account) {
            return Err(SwapError::account_not_found(account));
        }
        self.active_account_number = Some(account);
        Ok(())
    }

    fn from_document(document: RegistryDocument) -> Self {
        let mut accounts = BTreeMap::new();
        for (key, stored) in document.accounts {
            match key.trim().parse::<u32>() {
                Ok(n) if n > 0 => {
                    accounts.insert(n, AccountRecord::upgrade(stored));
                }
                _ => warn!("Dropping registry record with invalid account key {key:?}"),
            }
        }

        let mut sequence = Vec::with_capacity(accounts.len());
        for n in document.sequence {
            if !accounts.contains_key(&n) {
                warn!("Dropping Account-{n} from sequence: no record");
            } else if sequence.contains(&n) {
                warn!("Dropping duplicate Account-{n} from sequence");
            } else {
                sequence.push(n);
            }
        }
        for n in accounts.keys() {
            if !sequence.contains(n) {
                warn!("Appending Account-{n} to sequence: record had no entry");
                sequence.push(*n);
            }
        }

        let active_account_number = match document.active_account_number {
            Some(n) if !accounts.contains_key(&n) => {
                warn!("Clearing dangling active pointer to Account-{n}");
                None
            }
            other => other,
        };

        let max_existing = accounts.keys().next_back().copied().unwrap_or(0);
        let highest_assigned = document.highest_assigned.unwrap_or(0).max(max_existing);

        Self {
            active_account_number,
            sequence,
            accounts,
            last_updated: document.last_updated,
            highest_assigned,
        }
    }

    fn to_document(&self) -> RegistryDocument {
        RegistryDocument {
            active_account_number: self.active_account_number,
            sequence: self.sequence.clone(),
            accounts: self
                .accounts
                .iter()
                .map(|(n, record)| (n.to_string(), record.to_stored()))
                .collect(),
            last_updated: self.last_updated.clone(),
            highest_assigned: Some(self.highest_assigned).filter(|n| *n > 0),
        }
    }
}
