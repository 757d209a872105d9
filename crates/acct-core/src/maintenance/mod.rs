//! Keeps the archive directories consistent with the registry.

pub(crate) mod cleanup;
pub(crate) mod migration;
