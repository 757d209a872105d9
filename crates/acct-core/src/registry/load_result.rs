use crate::Registry;

/// Result of loading the registry - distinguishes "not found" from corruption.
#[derive(Debug)]
pub struct LoadResult {
    pub registry: Option<Registry>,
    /// Present if the file exists but does not parse
    pub corruption_error: Option<String>,
}

impl LoadResult {
    pub(crate) fn absent() -> Self {
        Self {
            registry: None,
            corruption_error: None,
        }
    }
}
