use crate::{BlobKind, BlobStore, NonFatal, Outcome, Registry};

use std::fs;
use std::path::PathBuf;

use log::{debug, info};
use serde::Serialize;

/// One archive file moved from the email-keyed name to the number-only name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedArchive {
    pub account: u32,
    pub kind: BlobKind,
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub renamed: Vec<RenamedArchive>,
}

/// Renames `{N}-{email}` archives to `{N}` archives for every record that
/// stores an email, unless the number-only file already exists.
///
/// Rename failures are non-fatal: the archive simply reads as absent later.
pub(crate) fn migrate_archive_names(
    store: &BlobStore,
    registry: &Registry,
) -> Outcome<MigrationReport> {
    let layout = store.layout();
    let mut report = MigrationReport::default();
    let mut non_fatal = Vec::new();

    for (account, record) in registry.records() {
        let Some(email) = record.email.as_deref().filter(|e| !e.is_empty()) else {
            continue;
        };

        for kind in BlobKind::ALL {
            let from = layout.legacy_archive_path(kind, account, email);
            let to = layout.archive_path(kind, account);
            if !from.is_file() || to.exists() {
                continue;
            }

            match fs::rename(&from, &to) {
                Ok(()) => {
                    debug!("Renamed {} to {}", from.display(), to.display());
                    report.renamed.push(RenamedArchive {
                        account,
                        kind,
                        from,
                        to,
                    });
                }
                Err(e) => non_fatal.push(NonFatal::legacy_rename(from, to, e)),
            }
        }
    }

    if !report.renamed.is_empty() {
        info!("Migrated {} legacy backup file(s)", report.renamed.len());
    }
    Outcome::new(report, non_fatal)
}
