use crate::{NonFatal, SwapError, SwapResult};

use std::fs;
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::Path;

use log::debug;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

pub(crate) const PRIVATE_FILE_MODE: u32 = 0o600; // Owner read/write only
pub(crate) const PRIVATE_DIR_MODE: u32 = 0o700;

/// Reads a whole text file; missing or unreadable files are `None`.
pub(crate) fn read_text(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        }),
        Err(e) if e.kind() == IoErrorKind::NotFound => None,
        Err(e) => {
            debug!("Treating unreadable {} as absent: {e}", path.display());
            None
        }
    }
}

/// Creates `dir` (and parents) and restricts it to the owner.
pub(crate) fn ensure_private_dir(dir: &Path) -> SwapResult<Vec<NonFatal>> {
    if dir.is_dir() {
        return Ok(Vec::new());
    }
    fs::create_dir_all(dir).map_err(|e| SwapError::io(dir.to_path_buf(), e))?;
    Ok(restrict_permissions(dir, PRIVATE_DIR_MODE).into_iter().collect())
}

/// Whole-file overwrite without rename; used for archive blobs nobody else reads.
pub(crate) fn write_private(path: &Path, contents: &[u8]) -> SwapResult<Vec<NonFatal>> {
    let mut non_fatal = ensure_parent(path)?;
    fs::write(path, contents).map_err(|e| SwapError::io(path.to_path_buf(), e))?;
    non_fatal.extend(restrict_permissions(path, PRIVATE_FILE_MODE));
    Ok(non_fatal)
}

/// Writes `contents` to `path` so readers see either the old or the new file.
///
/// 1. Writes to `<name>.tmp.<pid>` next to the target
/// 2. Syncs to disk (fsync)
/// 3. Renames over the target
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> SwapResult<Vec<NonFatal>> {
    let mut non_fatal = ensure_parent(path)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("blob"));
    let temp_path = path.with_file_name(format!("{file_name}.tmp.{}", std::process::id()));

    {
        let mut file =
            fs::File::create(&temp_path).map_err(|e| SwapError::io(temp_path.clone(), e))?;
        file.write_all(contents)
            .map_err(|e| SwapError::io(temp_path.clone(), e))?;
        file.sync_all()
            .map_err(|e| SwapError::io(temp_path.clone(), e))?;
    }

    non_fatal.extend(restrict_permissions(&temp_path, PRIVATE_FILE_MODE));

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        SwapError::atomic_rename(temp_path.clone(), path.to_path_buf(), e)
    })?;

    Ok(non_fatal)
}

fn ensure_parent(path: &Path) -> SwapResult<Vec<NonFatal>> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => ensure_private_dir(dir),
        _ => Ok(Vec::new()),
    }
}

#[cfg(unix)]
pub(crate) fn restrict_permissions(path: &Path, mode: u32) -> Option<NonFatal> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .err()
        .map(|e| NonFatal::permissions(path.to_path_buf(), e))
}

#[cfg(not(unix))]
pub(crate) fn restrict_permissions(_path: &Path, _mode: u32) -> Option<NonFatal> {
    None
}
