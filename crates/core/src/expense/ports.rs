//! Persistence collaborator for recorded transactions.

use std::future::Future;

use super::error::SinkError;
use super::types::TransactionRecord;

/// Stores transaction records atomically.
///
/// This trait is implemented by the persistence layer; the core performs no
/// storage of its own.
pub trait TransactionSink: Send + Sync {
    /// Stores a new transaction with its shares.
    fn insert(
        &self,
        record: TransactionRecord,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;

    /// Replaces an existing transaction and all of its shares.
    fn replace(
        &self,
        record: TransactionRecord,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}
