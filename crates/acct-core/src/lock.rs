//! PID lock file guarding the multi-step save/switch sequences.

use crate::blob_store::fs_util::{PRIVATE_FILE_MODE, ensure_private_dir};
use crate::{SwapError, SwapResult};

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    pid: u32,
    acquired_at: String,
}

/// Held for the duration of one swap; removed on drop.
///
/// A lock left behind by a process that is no longer running is stale and
/// gets replaced.
#[derive(Debug)]
pub struct SwapLock {
    path: PathBuf,
    file: Option<File>,
}

impl SwapLock {
    pub fn acquire(path: &Path) -> SwapResult<Self> {
        if let Some(dir) = path.parent() {
            ensure_private_dir(dir)?;
        }

        if let Some(existing) = read_lock_info(path) {
            if is_process_running(existing.pid) {
                return Err(SwapError::locked(existing.pid, path.to_path_buf()));
            }
            info!("Removing stale swap lock (PID {} not running)", existing.pid);
            fs::remove_file(path).ok();
        } else if path.exists() {
            warn!("Removing unreadable swap lock {}", path.display());
            fs::remove_file(path).ok();
        }

        let file = match open_exclusive(path) {
            Ok(file) => file,
            Err(e) if e.kind() == IoErrorKind::AlreadyExists => {
                let pid = read_lock_info(path).map(|info| info.pid).unwrap_or(0);
                return Err(SwapError::locked(pid, path.to_path_buf()));
            }
            Err(e) => return Err(SwapError::io(path.to_path_buf(), e)),
        };

        let mut lock = Self {
            path: path.to_path_buf(),
            file: Some(file),
        };
        lock.write_info()?;

        debug!("Acquired swap lock {}", lock.path.display());
        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_info(&mut self) -> SwapResult<()> {
        let info = LockInfo {
            pid: std::process::id(),
            acquired_at: chrono::Utc::now().to_rfc3339(),
        };
        let content = serde_json::to_string_pretty(&info)?;

        if let Some(ref mut file) = self.file {
            file.write_all(content.as_bytes())
                .and_then(|()| file.sync_all())
                .map_err(|e| SwapError::io(self.path.clone(), e))?;
        }
        Ok(())
    }

    /// Called automatically on drop.
    pub fn release(&mut self) {
        if self.file.take().is_some() {
            fs::remove_file(&self.path).ok();
            debug!("Released swap lock {}", self.path.display());
        }
    }
}

impl Drop for SwapLock {
    fn drop(&mut self) {
        self.release();
    }
}

fn read_lock_info(path: &Path) -> Option<LockInfo> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

#[cfg(unix)]
fn open_exclusive(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(PRIVATE_FILE_MODE)
        .open(path)
}

#[cfg(not(unix))]
fn open_exclusive(path: &Path) -> std::io::Result<File> {
    let _ = PRIVATE_FILE_MODE;
    OpenOptions::new().write(true).create_new(true).open(path)
}

/// Check if a process with the given PID is currently running.
#[cfg(unix)]
pub(crate) fn is_process_running(pid: u32) -> bool {
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }
    // SAFETY: kill with signal 0 only checks existence, no signal is sent.
    let alive = unsafe { libc::kill(pid, 0) == 0 };
    // EPERM means the process exists but belongs to someone else.
    alive || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
pub(crate) fn is_process_running(_pid: u32) -> bool {
    // No cheap liveness probe here; treat an existing lock as held.
    true
}
