//! Expense and transfer types.

use chrono::{DateTime, Utc};
use kitty_shared::types::{CurrencyCode, GroupId, MemberId, ScaledAmount, TransactionId};
use serde::{Deserialize, Serialize};

use crate::currency::ConvertedShare;
use crate::split::SplitPolicy;

/// Kind of group transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// A cost shared among members.
    Expense,
    /// Money handed from one member to another.
    Transfer,
}

/// A transaction about to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseDraft {
    /// Owning group.
    pub group_id: GroupId,
    /// Expense or transfer.
    pub kind: TransactionKind,
    /// Member who paid.
    pub payer: MemberId,
    /// Currency the amount was entered in.
    pub currency: CurrencyCode,
    /// The group's settlement currency.
    pub reference_currency: CurrencyCode,
    /// Amount in `currency`.
    pub total: ScaledAmount,
    /// How `total` is divided.
    pub split: SplitPolicy,
}

impl ExpenseDraft {
    /// A transfer: the recipient owes the whole amount back to the payer.
    #[must_use]
    pub fn transfer(
        group_id: GroupId,
        from: MemberId,
        to: MemberId,
        currency: CurrencyCode,
        reference_currency: CurrencyCode,
        amount: ScaledAmount,
    ) -> Self {
        Self {
            group_id,
            kind: TransactionKind::Transfer,
            payer: from,
            currency,
            reference_currency,
            total: amount,
            split: SplitPolicy::whole(to),
        }
    }
}

/// New values for an existing transaction. Shares are recomputed wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseEdit {
    /// Member who paid.
    pub payer: MemberId,
    /// Currency the amount is entered in.
    pub currency: CurrencyCode,
    /// Amount in `currency`.
    pub total: ScaledAmount,
    /// How `total` is divided.
    pub split: SplitPolicy,
}

impl ExpenseEdit {
    /// Edit values for a transfer.
    #[must_use]
    pub fn transfer(
        from: MemberId,
        to: MemberId,
        currency: CurrencyCode,
        amount: ScaledAmount,
    ) -> Self {
        Self {
            payer: from,
            currency,
            total: amount,
            split: SplitPolicy::whole(to),
        }
    }
}

/// A transaction with its snapshot rate, handed to persistence as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction identifier.
    pub id: TransactionId,
    /// Owning group.
    pub group_id: GroupId,
    /// Expense or transfer.
    pub kind: TransactionKind,
    /// Member who paid.
    pub payer: MemberId,
    /// Transaction currency.
    pub currency: CurrencyCode,
    /// Group settlement currency.
    pub reference_currency: CurrencyCode,
    /// Total in the transaction currency.
    pub total: ScaledAmount,
    /// Total in the reference currency.
    pub total_in_main: ScaledAmount,
    /// Snapshot rate, reference units per transaction unit.
    pub exchange_rate_to_main: ScaledAmount,
    /// When the snapshot rate was observed.
    pub rate_fetched_at: DateTime<Utc>,
    /// Per-member shares in both currencies.
    pub shares: Vec<ConvertedShare>,
}
