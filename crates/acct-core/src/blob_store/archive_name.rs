//! Archive file naming.
//!
//! Current scheme: `{prefix}{N}{suffix}`, e.g. `.creds-3.enc`.
//! Legacy scheme: `{prefix}{N}-{email}{suffix}`, e.g. `.creds-3-a@b.com.enc`.

use crate::BlobKind;

pub fn archive_file_name(kind: BlobKind, account: u32) -> String {
    format!("{}{account}{}", kind.archive_prefix(), kind.archive_suffix())
}

pub fn legacy_archive_file_name(kind: BlobKind, account: u32, email: &str) -> String {
    format!(
        "{}{account}-{email}{}",
        kind.archive_prefix(),
        kind.archive_suffix()
    )
}

/// Account number encoded in an archive file name of either scheme.
///
/// Returns `None` for anything that is not an archive file of `kind`, so
/// unrelated files in the archive directories are never mistaken for orphans.
pub fn parse_account_number(kind: BlobKind, file_name: &str) -> Option<u32> {
    let rest = file_name.strip_prefix(kind.archive_prefix())?;
    if !rest.ends_with(kind.archive_suffix()) {
        return None;
    }

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let (digits, tail) = rest.split_at(digits_len);
    if tail != kind.archive_suffix() && !tail.starts_with('-') {
        return None;
    }

    digits.parse().ok()
}
