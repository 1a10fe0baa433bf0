//! Expense service: split, snapshot a rate, convert, hand off.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kitty_shared::types::{CurrencyCode, MoneyError, ScaledAmount, TransactionId};
use tracing::info;

use super::error::ExpenseError;
use super::ports::TransactionSink;
use super::types::{ExpenseDraft, ExpenseEdit, TransactionRecord};
use crate::currency::{Conversion, ConversionEngine, CurrencyPair};
use crate::rates::RateLookup;
use crate::split::{MemberShare, SplitPolicy};

/// Records and edits group transactions.
pub struct ExpenseService<R: RateLookup, T: TransactionSink> {
    rates: Arc<R>,
    sink: Arc<T>,
}

impl<R: RateLookup, T: TransactionSink> ExpenseService<R, T> {
    /// Create a new expense service.
    #[must_use]
    pub fn new(rates: Arc<R>, sink: Arc<T>) -> Self {
        Self { rates, sink }
    }

    /// Records a new expense or transfer.
    ///
    /// The amount and split are validated before any lookup. The rate is
    /// resolved once and applied to the total and every share.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The total is negative
    /// - The split is invalid
    /// - No exchange rate is available (nothing is stored)
    /// - Persistence fails
    pub async fn record(&self, draft: ExpenseDraft) -> Result<TransactionRecord, ExpenseError> {
        let shares = allocate(draft.total, &draft.split)?;

        let pair = CurrencyPair::new(draft.currency.clone(), draft.reference_currency.clone());
        let quote = self.rates.rate(&pair).await?;
        let conversion = convert(draft.total, &shares, quote.rate)?;

        let record = TransactionRecord {
            id: TransactionId::new(),
            group_id: draft.group_id,
            kind: draft.kind,
            payer: draft.payer,
            currency: draft.currency,
            reference_currency: draft.reference_currency,
            total: draft.total,
            total_in_main: conversion.total_in_main,
            exchange_rate_to_main: quote.rate,
            rate_fetched_at: quote.fetched_at,
            shares: conversion.shares,
        };

        self.sink.insert(record.clone()).await?;

        info!(
            transaction_id = %record.id,
            group_id = %record.group_id,
            currency = %record.currency,
            rate = %record.exchange_rate_to_main,
            "Transaction recorded"
        );

        Ok(record)
    }

    /// Edits an existing transaction.
    ///
    /// An unchanged currency keeps the stored snapshot rate and its
    /// timestamp without any lookup. A changed currency resolves exactly one
    /// new rate into the unchanged reference currency.
    ///
    /// # Errors
    ///
    /// Same as [`ExpenseService::record`].
    pub async fn edit(
        &self,
        existing: &TransactionRecord,
        edit: ExpenseEdit,
    ) -> Result<TransactionRecord, ExpenseError> {
        let shares = allocate(edit.total, &edit.split)?;

        let (rate, rate_fetched_at) = self.snapshot_rate(existing, &edit.currency).await?;
        let conversion = convert(edit.total, &shares, rate)?;

        let record = TransactionRecord {
            id: existing.id,
            group_id: existing.group_id,
            kind: existing.kind,
            payer: edit.payer,
            currency: edit.currency,
            reference_currency: existing.reference_currency.clone(),
            total: edit.total,
            total_in_main: conversion.total_in_main,
            exchange_rate_to_main: rate,
            rate_fetched_at,
            shares: conversion.shares,
        };

        self.sink.replace(record.clone()).await?;

        info!(
            transaction_id = %record.id,
            currency_changed = record.currency != existing.currency,
            "Transaction updated"
        );

        Ok(record)
    }

    async fn snapshot_rate(
        &self,
        existing: &TransactionRecord,
        currency: &CurrencyCode,
    ) -> Result<(ScaledAmount, DateTime<Utc>), ExpenseError> {
        if *currency == existing.currency {
            return Ok((existing.exchange_rate_to_main, existing.rate_fetched_at));
        }
        let pair = CurrencyPair::new(currency.clone(), existing.reference_currency.clone());
        let quote = self.rates.rate(&pair).await?;
        Ok((quote.rate, quote.fetched_at))
    }
}

fn allocate(total: ScaledAmount, split: &SplitPolicy) -> Result<Vec<MemberShare>, ExpenseError> {
    if total.is_negative() {
        return Err(MoneyError::InvalidAmount {
            value: total.to_string(),
            reason: "must not be negative",
        }
        .into());
    }
    Ok(split.allocate(total)?)
}

fn convert(
    total: ScaledAmount,
    shares: &[MemberShare],
    rate: ScaledAmount,
) -> Result<Conversion, ExpenseError> {
    ConversionEngine::checked_convert(total, shares, rate).ok_or(ExpenseError::AmountOutOfRange)
}
