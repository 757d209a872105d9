//! Best-effort side effects that failed without aborting the operation.

use std::fmt;
use std::path::PathBuf;

use log::warn;
use serde::Serialize;

/// A swallowed failure. Produced (and logged) where it happens, then carried
/// back to the caller alongside the real result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NonFatal {
    PermissionsNotApplied { path: PathBuf, reason: String },
    LegacyRenameFailed {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },
    OrphanRemovalFailed { path: PathBuf, reason: String },
    ArchiveDirUnreadable { path: PathBuf, reason: String },
}

impl NonFatal {
    pub(crate) fn permissions(path: PathBuf, reason: impl ToString) -> Self {
        Self::PermissionsNotApplied {
            path,
            reason: reason.to_string(),
        }
        .logged()
    }

    pub(crate) fn legacy_rename(from: PathBuf, to: PathBuf, reason: impl ToString) -> Self {
        Self::LegacyRenameFailed {
            from,
            to,
            reason: reason.to_string(),
        }
        .logged()
    }

    pub(crate) fn orphan_removal(path: PathBuf, reason: impl ToString) -> Self {
        Self::OrphanRemovalFailed {
            path,
            reason: reason.to_string(),
        }
        .logged()
    }

    pub(crate) fn archive_dir(path: PathBuf, reason: impl ToString) -> Self {
        Self::ArchiveDirUnreadable {
            path,
            reason: reason.to_string(),
        }
        .logged()
    }

    fn logged(self) -> Self {
        warn!("{self}");
        self
    }
}

impl fmt::Display for NonFatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionsNotApplied { path, reason } => {
                write!(f, "could not restrict permissions on {}: {reason}", path.display())
            }
            Self::LegacyRenameFailed { from, to, reason } => write!(
                f,
                "could not rename legacy backup {} to {}: {reason}",
                from.display(),
                to.display()
            ),
            Self::OrphanRemovalFailed { path, reason } => {
                write!(f, "could not remove orphaned backup {}: {reason}", path.display())
            }
            Self::ArchiveDirUnreadable { path, reason } => {
                write!(f, "could not list backup directory {}: {reason}", path.display())
            }
        }
    }
}

/// Result value plus the non-fatal failures met while producing it.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T> {
    pub value: T,
    pub non_fatal: Vec<NonFatal>,
}

impl<T> Outcome<T> {
    pub fn new(value: T, non_fatal: Vec<NonFatal>) -> Self {
        Self { value, non_fatal }
    }

    pub fn clean(value: T) -> Self {
        Self::new(value, Vec::new())
    }

    pub fn is_clean(&self) -> bool {
        self.non_fatal.is_empty()
    }
}
