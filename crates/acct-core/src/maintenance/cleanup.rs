use crate::blob_store::archive_name::parse_account_number;
use crate::{BlobKind, BlobStore, NonFatal, Outcome, Registry};

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;

use log::{debug, info, warn};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    /// Corrupted registry backup that kept unregistered archives in place.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub held_back_by: Option<PathBuf>,
}

/// Deletes archive files whose account number has no registry record.
///
/// Files that are not archive files of the directory's kind are left alone.
/// Nothing is removed while a corrupted registry backup exists: the records
/// it held may still own archives. Deleting the backup once the registry is
/// repaired re-enables cleanup.
pub(crate) fn remove_orphans(store: &BlobStore, registry: &Registry) -> Outcome<CleanupReport> {
    let mut report = CleanupReport::default();
    if let Some(backup) = Registry::corrupted_backups(&store.layout().registry_file()).pop() {
        warn!(
            "Keeping unregistered backups until corrupted registry {} is repaired or removed",
            backup.display()
        );
        report.held_back_by = Some(backup);
        return Outcome::clean(report);
    }

    let mut non_fatal = Vec::new();

    for kind in BlobKind::ALL {
        let dir = store.layout().archive_dir(kind);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == IoErrorKind::NotFound => continue,
            Err(e) => {
                non_fatal.push(NonFatal::archive_dir(dir, e));
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(account) = parse_account_number(kind, &file_name.to_string_lossy()) else {
                continue;
            };
            if registry.contains(account) {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Removed orphaned {kind} backup {}", path.display());
                    report.removed.push(path);
                }
                Err(e) => non_fatal.push(NonFatal::orphan_removal(path, e)),
            }
        }
    }

    if !report.removed.is_empty() {
        info!("Removed {} orphaned backup file(s)", report.removed.len());
    }
    report.removed.sort();
    Outcome::new(report, non_fatal)
}
