use std::fmt;

use serde::Serialize;

/// The two blob families that move between the live slot and the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobKind {
    Credential,
    Config,
}

impl BlobKind {
    pub const ALL: [BlobKind; 2] = [BlobKind::Credential, BlobKind::Config];

    pub(crate) fn archive_prefix(self) -> &'static str {
        match self {
            BlobKind::Credential => ".creds-",
            BlobKind::Config => ".claude-config-",
        }
    }

    pub(crate) fn archive_suffix(self) -> &'static str {
        match self {
            BlobKind::Credential => ".enc",
            BlobKind::Config => ".json",
        }
    }

    pub(crate) fn archive_dir_name(self) -> &'static str {
        match self {
            BlobKind::Credential => "credentials",
            BlobKind::Config => "configs",
        }
    }
}

impl fmt::Display for BlobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BlobKind::Credential => "credential",
            BlobKind::Config => "config",
        })
    }
}
