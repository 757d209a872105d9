use crate::BlobKind;
use crate::blob_store::archive_name::{archive_file_name, legacy_archive_file_name};

use std::path::{Path, PathBuf};

const REGISTRY_FILE_NAME: &str = "sequence.json";
const LOCK_FILE_NAME: &str = "swap.lock";

/// Where every blob lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    pub credential_file: PathBuf,
    pub config_file: PathBuf,
    pub fallback_config_file: PathBuf,
    pub backup_dir: PathBuf,
}

impl StoreLayout {
    pub fn new(
        credential_file: PathBuf,
        config_file: PathBuf,
        fallback_config_file: PathBuf,
        backup_dir: PathBuf,
    ) -> Self {
        Self {
            credential_file,
            config_file,
            fallback_config_file,
            backup_dir,
        }
    }

    /// Layout rooted in one directory, mirroring the host CLI's defaults.
    pub fn rooted_at(home: &Path) -> Self {
        Self::new(
            home.join(".claude").join(".credentials.json"),
            home.join(".claude").join(".claude.json"),
            home.join(".claude.json"),
            home.join(".claude-swap-backup"),
        )
    }

    pub fn registry_file(&self) -> PathBuf {
        self.backup_dir.join(REGISTRY_FILE_NAME)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.backup_dir.join(LOCK_FILE_NAME)
    }

    pub fn archive_dir(&self, kind: BlobKind) -> PathBuf {
        self.backup_dir.join(kind.archive_dir_name())
    }

    pub fn archive_path(&self, kind: BlobKind, account: u32) -> PathBuf {
        self.archive_dir(kind).join(archive_file_name(kind, account))
    }

    pub fn legacy_archive_path(&self, kind: BlobKind, account: u32, email: &str) -> PathBuf {
        self.archive_dir(kind)
            .join(legacy_archive_file_name(kind, account, email))
    }
}
