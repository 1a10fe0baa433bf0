//! Splitting a transaction total into per-member shares.
//!
//! Every policy guarantees that the shares sum to the total exactly. Any
//! residual scaled units go to the first participants in input order.

pub mod allocation;
pub mod error;
pub mod policy;

#[cfg(test)]
mod props;

pub use allocation::SplitAllocator;
pub use error::SplitError;
pub use policy::{ExactEntry, MemberShare, PercentageEntry, SplitPolicy};
