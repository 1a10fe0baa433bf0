//! Expense flow error types.

use kitty_shared::AppError;
use kitty_shared::types::MoneyError;
use thiserror::Error;

use crate::rates::RateError;
use crate::split::SplitError;

/// Persistence collaborator failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("persistence failed: {0}")]
pub struct SinkError(pub String);

/// Errors raised while recording or editing a transaction.
#[derive(Debug, Error)]
pub enum ExpenseError {
    /// The amount was rejected.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// The split was rejected.
    #[error("invalid split: {0}")]
    Split(#[from] SplitError),

    /// No rate could be obtained; nothing was saved.
    #[error(transparent)]
    Rate(#[from] RateError),

    /// Converted amounts exceed the supported magnitude.
    #[error("converted amount out of range")]
    AmountOutOfRange,

    /// The record could not be stored.
    #[error(transparent)]
    Persistence(#[from] SinkError),
}

impl From<ExpenseError> for AppError {
    fn from(err: ExpenseError) -> Self {
        match err {
            ExpenseError::Money(e) => e.into(),
            ExpenseError::Split(_) => Self::Validation(err.to_string()),
            ExpenseError::Rate(e) => e.into(),
            ExpenseError::AmountOutOfRange => Self::Validation(err.to_string()),
            ExpenseError::Persistence(e) => Self::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencyPair;
    use rust_decimal_macros::dec;

    #[test]
    fn test_app_error_mapping() {
        let split: AppError =
            ExpenseError::from(SplitError::PercentageSum { sum: dec!(99) }).into();
        assert_eq!(split.error_code(), "VALIDATION_ERROR");

        let count: AppError = ExpenseError::from(SplitError::InvalidParticipantCount).into();
        assert_eq!(count.error_code(), "VALIDATION_ERROR");
        assert!(!count.is_retryable());

        let pair = CurrencyPair::parse("EUR", "USD").unwrap();
        let rate: AppError = ExpenseError::from(RateError::unavailable(&pair)).into();
        assert_eq!(rate.error_code(), "RATE_UNAVAILABLE");
        assert!(rate.is_retryable());

        let sink: AppError = ExpenseError::from(SinkError("locked".into())).into();
        assert_eq!(sink.error_code(), "DATABASE_ERROR");
    }
}
