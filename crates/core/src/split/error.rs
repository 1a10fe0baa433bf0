//! Split error types.

use kitty_shared::types::{MemberId, ScaledAmount};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while splitting a total.
///
/// Every variant is a problem with the split input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    /// A split needs at least one participant.
    #[error("A split needs at least one participant")]
    InvalidParticipantCount,

    /// Percentages do not sum to 100 within tolerance.
    #[error("Percentages must sum to 100, got {sum}")]
    PercentageSum {
        /// The supplied sum.
        sum: Decimal,
    },

    /// A single percentage is outside 0-100.
    #[error("Percentage {value} is outside 0-100")]
    PercentageOutOfRange {
        /// The offending percentage.
        value: Decimal,
    },

    /// Exact amounts do not add up and normalization was not requested.
    #[error("Exact amounts sum to {actual}, expected {expected}")]
    ExactSum {
        /// The transaction total.
        expected: ScaledAmount,
        /// The sum of the supplied amounts.
        actual: ScaledAmount,
    },

    /// Amounts summing to zero cannot be rescaled onto a non-zero total.
    #[error("Cannot normalize amounts summing to zero onto a total of {total}")]
    CannotNormalize {
        /// The transaction total.
        total: ScaledAmount,
    },

    /// The same member was listed twice.
    #[error("Member {0} appears more than once in the split")]
    DuplicateParticipant(MemberId),

    /// Intermediate amounts left the supported range.
    #[error("Split amounts exceed the supported range")]
    AmountOutOfRange,
}
