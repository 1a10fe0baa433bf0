//! Key-value store implementation using Apache OpenDAL.

use opendal::{ErrorKind, Operator, services};
use tracing::debug;

use super::config::StorageProvider;
use super::error::StorageError;
use crate::rates::{KeyValueStore, StoreError};

/// String key-value store over an OpenDAL operator.
///
/// Keys are `:`-separated segments; each maps to a JSON object path, so
/// `exchange_rate:USD:EUR` lives at `exchange_rate/USD/EUR.json`.
#[derive(Clone)]
pub struct OpendalKeyValueStore {
    operator: Operator,
    provider: &'static str,
}

impl OpendalKeyValueStore {
    /// Create a store for the given provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_provider(provider: &StorageProvider) -> Result<Self, StorageError> {
        let operator = Self::create_operator(provider)?;
        Ok(Self {
            operator,
            provider: provider.name(),
        })
    }

    /// Create an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory service cannot be initialized.
    pub fn memory() -> Result<Self, StorageError> {
        Self::from_provider(&StorageProvider::Memory)
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::Memory => Ok(Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()),
        }
    }

    /// Map a key onto its object path.
    ///
    /// Segments may hold ASCII alphanumerics, `-` and `_` only.
    pub fn object_path(key: &str) -> Result<String, StorageError> {
        let valid_segment = |segment: &str| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        };
        if !key.split(':').all(valid_segment) {
            return Err(StorageError::invalid_key(key));
        }
        Ok(format!("{}.json", key.replace(':', "/")))
    }

    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid keys, backend failures or non-UTF-8 data.
    pub async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = Self::object_path(key)?;
        let buffer = match self.operator.read(&path).await {
            Ok(buffer) => buffer,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        String::from_utf8(buffer.to_vec())
            .map(Some)
            .map_err(|_| StorageError::NotText {
                key: key.to_string(),
            })
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid keys or backend failures.
    pub async fn write(&self, key: &str, value: String) -> Result<(), StorageError> {
        let path = Self::object_path(key)?;
        self.operator.write(&path, value.into_bytes()).await?;
        debug!(provider = self.provider, path = %path, "Stored local value");
        Ok(())
    }
}

impl KeyValueStore for OpendalKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.read(key).await.map_err(StoreError::from)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.write(key, value).await.map_err(StoreError::from)
    }
}
