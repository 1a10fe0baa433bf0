//! Member-keyed split policies.

use std::collections::HashSet;

use kitty_shared::types::{MemberId, ScaledAmount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::allocation::SplitAllocator;
use super::error::SplitError;

/// A participant's percentage in a percentage split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentageEntry {
    /// The participant.
    pub member_id: MemberId,
    /// Percentage of the total, 0-100.
    pub percentage: Decimal,
}

/// A participant's explicit amount in an exact split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactEntry {
    /// The participant.
    pub member_id: MemberId,
    /// Amount in the transaction currency.
    pub amount: ScaledAmount,
}

/// One participant's share in the transaction currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberShare {
    /// The participant.
    pub member_id: MemberId,
    /// Share of the total in the transaction currency.
    pub amount: ScaledAmount,
}

/// How a transaction total is divided among members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Equal shares; earlier members absorb the remainder.
    Equal {
        /// Participants in display order.
        members: Vec<MemberId>,
    },
    /// Percentage shares summing to 100.
    Percentage {
        /// Participants and their percentages.
        entries: Vec<PercentageEntry>,
    },
    /// Explicit amounts.
    Exact {
        /// Participants and their amounts.
        entries: Vec<ExactEntry>,
        /// Rescale the amounts onto the total instead of rejecting a mismatch.
        #[serde(default)]
        normalize: bool,
    },
}

impl SplitPolicy {
    /// A single member owes the whole amount (e.g. the recipient of a transfer).
    #[must_use]
    pub fn whole(member_id: MemberId) -> Self {
        Self::Equal {
            members: vec![member_id],
        }
    }

    /// Participants in input order.
    #[must_use]
    pub fn members(&self) -> Vec<MemberId> {
        match self {
            Self::Equal { members } => members.clone(),
            Self::Percentage { entries } => entries.iter().map(|e| e.member_id).collect(),
            Self::Exact { entries, .. } => entries.iter().map(|e| e.member_id).collect(),
        }
    }

    /// Divides `total` among the members.
    ///
    /// The returned shares are in input order and sum exactly to `total`.
    pub fn allocate(&self, total: ScaledAmount) -> Result<Vec<MemberShare>, SplitError> {
        let members = self.members();
        let mut seen = HashSet::with_capacity(members.len());
        if let Some(duplicate) = members.iter().find(|m| !seen.insert(**m)) {
            return Err(SplitError::DuplicateParticipant(*duplicate));
        }

        let amounts = match self {
            Self::Equal { members } => SplitAllocator::equal(total, members.len())?,
            Self::Percentage { entries } => {
                let percentages: Vec<Decimal> = entries.iter().map(|e| e.percentage).collect();
                SplitAllocator::by_percentages(total, &percentages)?
            }
            Self::Exact { entries, normalize } => {
                let amounts: Vec<ScaledAmount> = entries.iter().map(|e| e.amount).collect();
                if *normalize {
                    SplitAllocator::normalize(total, &amounts)?
                } else {
                    SplitAllocator::exact(total, &amounts)?
                }
            }
        };

        Ok(members
            .into_iter()
            .zip(amounts)
            .map(|(member_id, amount)| MemberShare { member_id, amount })
            .collect())
    }
}
