//! Storage error types.

use thiserror::Error;

use crate::rates::StoreError;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),

    /// Invalid storage key format.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// Stored bytes are not UTF-8 text.
    #[error("stored value under {key} is not valid UTF-8")]
    NotText {
        /// Storage key that was read.
        key: String,
    },
}

impl StorageError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an invalid key error.
    #[must_use]
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey(key.into())
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        Self::Operation(err.to_string())
    }
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey(key) => Self::InvalidKey(key),
            StorageError::NotText { .. } => Self::Corrupt(err.to_string()),
            StorageError::Configuration(_) | StorageError::Operation(_) => {
                Self::Backend(err.to_string())
            }
        }
    }
}
