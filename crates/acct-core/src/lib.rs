//! Multi-account credential swapping for a CLI that keeps one live login.
//!
//! The live credential and config files are moved in and out of a per-account
//! archive, with account identity derived from the credential's token rather
//! than from anything the user types.

pub(crate) mod blob_store;
pub(crate) mod error;
pub(crate) mod identity;
pub(crate) mod lock;
pub(crate) mod maintenance;
pub(crate) mod monitor;
pub(crate) mod outcome;
pub(crate) mod registry;
pub(crate) mod swap;

#[cfg(test)]
mod tests;

pub use blob_store::BlobStore;
pub use blob_store::archive_name::{
    archive_file_name, legacy_archive_file_name, parse_account_number,
};
pub use blob_store::blob_kind::BlobKind;
pub use blob_store::store_layout::StoreLayout;
pub use error::{ErrorKind, SwapError, SwapResult};
pub use identity::mask::mask_token;
pub use identity::resolved_identity::{ResolutionStrategy, ResolvedIdentity, Subject};
pub use identity::token::{CredentialTokens, decode_claims, extract_tokens};
pub use identity::{fingerprint, resolve_identity, resolve_identity_from, resolve_subject};
pub use lock::SwapLock;
pub use maintenance::cleanup::CleanupReport;
pub use maintenance::migration::{MigrationReport, RenamedArchive};
pub use monitor::monitor_state::MonitorState;
pub use monitor::usage::{UsageReport, UsageSource, UsageWindow};
pub use monitor::{Monitor, MonitorSnapshot};
pub use outcome::{NonFatal, Outcome};
pub use registry::Registry;
pub use registry::account_record::{AccountRecord, RecordIdentity};
pub use registry::load_result::LoadResult;
pub use swap::SwapEngine;
pub use swap::debug_snapshot::{ArchivedDebug, CredentialDebug, DebugSnapshot};
pub use swap::reports::{AccountSummary, ActiveSource, StatusReport, SwitchReport};
