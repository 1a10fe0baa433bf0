//! Recording and editing group expenses and transfers.
//!
//! Flow: split in the transaction currency, snapshot one rate into the
//! group's reference currency, convert the total and every share with that
//! rate, then hand one record to persistence. A missing rate blocks the
//! action before anything is stored.

pub mod error;
pub mod ports;
pub mod service;
pub mod types;


pub use error::{ExpenseError, SinkError};
pub use ports::TransactionSink;
pub use service::ExpenseService;
pub use types::{ExpenseDraft, ExpenseEdit, TransactionKind, TransactionRecord};
