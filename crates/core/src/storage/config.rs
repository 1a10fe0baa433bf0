//! Storage configuration types.

use std::path::PathBuf;

use kitty_shared::config::LocalStoreConfig;
use serde::{Deserialize, Serialize};

/// Backend for the local key-value tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// Local filesystem, persisted across restarts.
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// Process memory (tests, ephemeral deployments).
    Memory,
}

impl StorageProvider {
    /// Create local filesystem provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LocalFs { .. } => "local",
            Self::Memory => "memory",
        }
    }
}

impl From<&LocalStoreConfig> for StorageProvider {
    fn from(config: &LocalStoreConfig) -> Self {
        config
            .root
            .as_ref()
            .map_or(Self::Memory, |root| Self::local_fs(root.clone()))
    }
}
