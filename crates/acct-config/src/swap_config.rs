use crate::DEFAULT_USE_LOCK;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SwapConfig {
    /// Hold `swap.lock` in the backup directory while saving or switching.
    pub use_lock: bool,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            use_lock: DEFAULT_USE_LOCK,
        }
    }
}
