use crate::BlobKind;

use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

/// Failure classes surfaced to the invoking layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Malformed,
    Io,
}

/// Errors raised by the swap subsystem.
///
/// Best-effort failures (permissions, legacy renames, orphan removal) are
/// never represented here; they travel as [`crate::NonFatal`] values.
#[derive(Error, Debug)]
pub enum SwapError {
    #[error("No credential found at {path}. Log in with the host CLI first. {location}")]
    NoCredential {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("No access token found in the current credential {location}")]
    NoToken { location: ErrorLocation },

    #[error("No application config with account data found at {path} {location}")]
    NoConfig {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("This identity is already saved as Account-{account} {location}")]
    IdentityAlreadySaved {
        account: u32,
        location: ErrorLocation,
    },

    #[error("Account-{account} not found {location}")]
    AccountNotFound {
        account: u32,
        location: ErrorLocation,
    },

    #[error("Missing backup data for Account-{account} ({kind} backup) {location}")]
    MissingBackup {
        account: u32,
        kind: BlobKind,
        location: ErrorLocation,
    },

    #[error("Invalid backup config for Account-{account}: {message} {location}")]
    InvalidBackupConfig {
        account: u32,
        message: String,
        location: ErrorLocation,
    },

    #[error("Live config at {path} is not a JSON object: {message} {location}")]
    MalformedConfig {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
    },

    #[error("No account numbers left to assign {location}")]
    AccountNumbersExhausted { location: ErrorLocation },

    #[error("Credential is not valid JSON: {message} {location}")]
    MalformedCredential {
        message: String,
        location: ErrorLocation,
    },

    #[error("Another swap is in progress (PID {pid}, lock {path}) {location}")]
    Locked {
        pid: u32,
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("I/O error at {path}: {source} {location}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Atomic rename failed from {from} to {to}: {source} {location}")]
    AtomicRename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Failed to serialize registry: {source} {location}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },
}

impl SwapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoCredential { .. }
            | Self::NoToken { .. }
            | Self::NoConfig { .. }
            | Self::AccountNotFound { .. }
            | Self::MissingBackup { .. } => ErrorKind::NotFound,
            Self::IdentityAlreadySaved { .. }
            | Self::Locked { .. }
            | Self::AccountNumbersExhausted { .. } => ErrorKind::Conflict,
            Self::InvalidBackupConfig { .. }
            | Self::MalformedCredential { .. }
            | Self::MalformedConfig { .. } => ErrorKind::Malformed,
            Self::Io { .. } | Self::AtomicRename { .. } | Self::Serialization { .. } => {
                ErrorKind::Io
            }
        }
    }

    /// Whether this error is recoverable via retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::AtomicRename { .. } | Self::Locked { .. }
        )
    }

    /// User-friendly recovery hint.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::NoCredential { .. } | Self::NoToken { .. } => {
                "Log in with the host CLI so a credential exists, then try again."
            }
            Self::NoConfig { .. } => {
                "Start the host CLI once so it writes its config file, then try again."
            }
            Self::IdentityAlreadySaved { .. } => {
                "This login is already saved. Log in with a different account to save it."
            }
            Self::AccountNotFound { .. } => "Run `acct list` to see the saved account numbers.",
            Self::MissingBackup { .. } => {
                "The backup files for this account are gone. Switch to it by logging in \
                   again and saving it as a new account."
            }
            Self::InvalidBackupConfig { .. } => {
                "The stored config for this account is damaged. Log in again and re-save it."
            }
            Self::MalformedCredential { .. } => {
                "The live credential file is damaged. Log in again with the host CLI."
            }
            Self::MalformedConfig { .. } => {
                "The live config file is damaged. Fix or remove it, then try again."
            }
            Self::AccountNumbersExhausted { .. } => {
                "Every account number is taken. Remove unused entries from sequence.json \
                   and their backup files."
            }
            Self::Locked { .. } => "Wait for the other swap to finish, then try again.",
            Self::Io { .. } | Self::AtomicRename { .. } => {
                "Check disk space and permissions on the credential and backup directories."
            }
            Self::Serialization { .. } => "Internal error writing the registry. Please report it.",
        }
    }

    #[track_caller]
    pub fn no_credential(path: PathBuf) -> Self {
        Self::NoCredential {
            path,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn no_token() -> Self {
        Self::NoToken {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn no_config(path: PathBuf) -> Self {
        Self::NoConfig {
            path,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn identity_already_saved(account: u32) -> Self {
        Self::IdentityAlreadySaved {
            account,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn account_not_found(account: u32) -> Self {
        Self::AccountNotFound {
            account,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn missing_backup(account: u32, kind: BlobKind) -> Self {
        Self::MissingBackup {
            account,
            kind,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_backup_config(account: u32, message: impl Into<String>) -> Self {
        Self::InvalidBackupConfig {
            account,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn malformed_credential(message: impl Into<String>) -> Self {
        Self::MalformedCredential {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn malformed_config(path: PathBuf, message: impl Into<String>) -> Self {
        Self::MalformedConfig {
            path,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn account_numbers_exhausted() -> Self {
        Self::AccountNumbersExhausted {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn locked(pid: u32, path: PathBuf) -> Self {
        Self::Locked {
            pid,
            path,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn io(path: PathBuf, source: std::io::Error) -> Self {
        Self::Io {
            path,
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn atomic_rename(from: PathBuf, to: PathBuf, source: std::io::Error) -> Self {
        Self::AtomicRename {
            from,
            to,
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for SwapError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        Self::Serialization {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type SwapResult<T> = std::result::Result<T, SwapError>;
