//! Currency conversion.
//!
//! CRITICAL: one transaction is converted with exactly one rate. The rate is
//! captured once at save time and applied to the total and to every share.

use kitty_shared::types::{MemberId, ScaledAmount};
use serde::{Deserialize, Serialize};

use crate::split::MemberShare;
use crate::split::allocation::distribute_residual;

/// A share with its amount in both the transaction and reference currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedShare {
    /// The participant.
    pub member_id: MemberId,
    /// Share in the transaction currency.
    pub amount: ScaledAmount,
    /// Share in the reference currency.
    pub amount_in_main: ScaledAmount,
}

/// Result of converting a whole transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// Total in the reference currency.
    pub total_in_main: ScaledAmount,
    /// Shares in input order.
    pub shares: Vec<ConvertedShare>,
}

/// Applies snapshotted rates to amounts.
pub struct ConversionEngine;

impl ConversionEngine {
    /// `round(amount * rate / SCALE)`, half away from zero.
    ///
    /// # Panics
    ///
    /// Panics if the result exceeds the supported magnitude.
    #[must_use]
    pub fn apply_rate(amount: ScaledAmount, rate: ScaledAmount) -> ScaledAmount {
        amount.scale_by_rate(rate)
    }

    /// Rate used when transaction and reference currency are equal.
    #[must_use]
    pub const fn same_currency_rate() -> ScaledAmount {
        ScaledAmount::ONE
    }

    /// Converts a total and its shares with one rate.
    ///
    /// Each share is converted with the same rate. When the shares add up to
    /// the total, the rounding residual is then spread over the converted
    /// shares, first participants first, so they add up to the converted
    /// total exactly.
    ///
    /// # Example
    ///
    /// ```
    /// use kitty_core::currency::ConversionEngine;
    /// use kitty_core::split::SplitPolicy;
    /// use kitty_shared::types::{MemberId, ScaledAmount};
    ///
    /// let total = ScaledAmount::from_scaled(100_000);
    /// let shares = SplitPolicy::whole(MemberId::new()).allocate(total).unwrap();
    /// let rate = ScaledAmount::from_scaled(20_000);
    /// let converted = ConversionEngine::convert(total, &shares, rate);
    /// assert_eq!(converted.total_in_main.scaled(), 200_000);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if any converted amount exceeds the supported magnitude.
    #[must_use]
    pub fn convert(total: ScaledAmount, shares: &[MemberShare], rate: ScaledAmount) -> Conversion {
        match Self::checked_convert(total, shares, rate) {
            Some(conversion) => conversion,
            None => panic!("scaled amount overflow converting {total} at rate {rate}"),
        }
    }

    /// Like [`ConversionEngine::convert`], returning `None` on overflow.
    #[must_use]
    pub fn checked_convert(
        total: ScaledAmount,
        shares: &[MemberShare],
        rate: ScaledAmount,
    ) -> Option<Conversion> {
        let total_in_main = total.checked_scale_by_rate(rate)?;
        let mut in_main = shares
            .iter()
            .map(|share| share.amount.checked_scale_by_rate(rate))
            .collect::<Option<Vec<_>>>()?;

        if raw_sum(shares.iter().map(|share| share.amount)) == i128::from(total.scaled()) {
            let residual = i128::from(total_in_main.scaled()) - raw_sum(in_main.iter().copied());
            distribute_residual(&mut in_main, i64::try_from(residual).ok()?);
        }

        let shares = shares
            .iter()
            .zip(in_main)
            .map(|(share, amount_in_main)| ConvertedShare {
                member_id: share.member_id,
                amount: share.amount,
                amount_in_main,
            })
            .collect();
        Some(Conversion {
            total_in_main,
            shares,
        })
    }
}

fn raw_sum(amounts: impl Iterator<Item = ScaledAmount>) -> i128 {
    amounts.map(|amount| i128::from(amount.scaled())).sum()
}
