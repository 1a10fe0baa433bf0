//! Local key-value tier using Apache OpenDAL.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Apache OpenDAL                              │
//! │                   (Unified Storage API)                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ op.write("path", bytes)    │ op.read("path")                    │
//! │ keys: a:b:c -> a/b/c.json  │ NotFound -> Ok(None)               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod service;

pub use config::StorageProvider;
pub use error::StorageError;
pub use service::OpendalKeyValueStore;
