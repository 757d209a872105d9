use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_BACKUP_DIR, DEFAULT_CONFIG_FILE,
    DEFAULT_CREDENTIAL_FILE, DEFAULT_FALLBACK_CONFIG_FILE,
};

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Locations of the live slot and the archive.
///
/// Values are kept as written so `log_summary` shows what the user typed;
/// a leading `~/` is expanded when the paths are resolved.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub credential_file: String,
    /// Primary live config; only used when it already holds `oauthAccount`.
    pub config_file: String,
    pub fallback_config_file: String,
    pub backup_dir: String,
}

impl PathsConfig {
    pub fn credential_file_path(&self) -> ConfigErrorResult<PathBuf> {
        expand_home(&self.credential_file)
    }

    pub fn config_file_path(&self) -> ConfigErrorResult<PathBuf> {
        expand_home(&self.config_file)
    }

    pub fn fallback_config_file_path(&self) -> ConfigErrorResult<PathBuf> {
        expand_home(&self.fallback_config_file)
    }

    pub fn backup_dir_path(&self) -> ConfigErrorResult<PathBuf> {
        expand_home(&self.backup_dir)
    }

    pub fn validate(&self) -> ConfigErrorResult<()> {
        for (key, value) in [
            ("credential_file", &self.credential_file),
            ("config_file", &self.config_file),
            ("fallback_config_file", &self.fallback_config_file),
            ("backup_dir", &self.backup_dir),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::paths(format!("paths.{key} cannot be empty")));
            }
        }

        let credential_file = self.credential_file_path()?;
        let backup_dir = self.backup_dir_path()?;
        if credential_file.parent() == Some(backup_dir.as_path()) {
            return Err(ConfigError::paths(format!(
                "paths.backup_dir ({}) must not be the directory holding the live credential file",
                backup_dir.display()
            )));
        }

        Ok(())
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            credential_file: String::from(DEFAULT_CREDENTIAL_FILE),
            config_file: String::from(DEFAULT_CONFIG_FILE),
            fallback_config_file: String::from(DEFAULT_FALLBACK_CONFIG_FILE),
            backup_dir: String::from(DEFAULT_BACKUP_DIR),
        }
    }
}

fn expand_home(raw: &str) -> ConfigErrorResult<PathBuf> {
    if raw == "~" || raw.starts_with("~/") {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        return Ok(expand_home_with(raw, &home));
    }
    Ok(PathBuf::from(raw))
}

/// Expands a leading `~` against `home`; other paths pass through untouched.
pub(crate) fn expand_home_with(raw: &str, home: &Path) -> PathBuf {
    if raw == "~" {
        return home.to_path_buf();
    }
    match raw.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(raw),
    }
}
