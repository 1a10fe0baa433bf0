//! Amount allocation on scaled integers.
//!
//! Each allocation computes provisional shares, measures the residual
//! against the total, and hands the residual out one scaled unit at a time
//! to the first participants in input order. The same input always
//! produces the same shares.

use kitty_shared::types::ScaledAmount;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::SplitError;

/// Allowed distance between the supplied percentage sum and 100.
const PERCENTAGE_TOLERANCE: Decimal = dec!(0.01);

const HUNDRED: Decimal = dec!(100);

/// Allocation utility for distributing a total among participants.
///
/// All functions guarantee that the returned shares sum exactly to the
/// total; no scaled unit is lost or created.
pub struct SplitAllocator;

impl SplitAllocator {
    /// Splits `total` equally across `count` participants.
    ///
    /// The first `total % count` participants receive one extra scaled unit.
    ///
    /// # Example
    ///
    /// ```
    /// use kitty_core::split::SplitAllocator;
    /// use kitty_shared::types::ScaledAmount;
    ///
    /// // 10.00 / 3 = [3.3334, 3.3333, 3.3333]
    /// let shares = SplitAllocator::equal(ScaledAmount::from_scaled(100_000), 3).unwrap();
    /// let raw: Vec<i64> = shares.iter().map(|s| s.scaled()).collect();
    /// assert_eq!(raw, vec![33_334, 33_333, 33_333]);
    /// ```
    pub fn equal(total: ScaledAmount, count: usize) -> Result<Vec<ScaledAmount>, SplitError> {
        if count == 0 {
            return Err(SplitError::InvalidParticipantCount);
        }
        if count == 1 {
            return Ok(vec![total]);
        }

        let divisor = i64::try_from(count).map_err(|_| SplitError::InvalidParticipantCount)?;
        let base = ScaledAmount::from_scaled(total.scaled() / divisor);
        let mut shares = vec![base; count];
        distribute_residual(&mut shares, total.scaled() % divisor);
        Ok(shares)
    }

    /// Splits `total` by percentages (0-100, summing to 100 within 0.01).
    ///
    /// Each share is `total * percentage / 100` rounded half away from zero;
    /// the rounding residual is then handed to the first participants.
    pub fn by_percentages(
        total: ScaledAmount,
        percentages: &[Decimal],
    ) -> Result<Vec<ScaledAmount>, SplitError> {
        if percentages.is_empty() {
            return Err(SplitError::InvalidParticipantCount);
        }

        if let Some(value) = percentages
            .iter()
            .find(|p| (p.is_sign_negative() && !p.is_zero()) || **p > HUNDRED)
        {
            return Err(SplitError::PercentageOutOfRange { value: *value });
        }

        let sum: Decimal = percentages.iter().sum();
        if (sum - HUNDRED).abs() > PERCENTAGE_TOLERANCE {
            return Err(SplitError::PercentageSum { sum });
        }

        let mut shares = percentages
            .iter()
            .map(|p| {
                let rate = ScaledAmount::from_decimal(*p / HUNDRED)
                    .map_err(|_| SplitError::PercentageOutOfRange { value: *p })?;
                total
                    .checked_scale_by_rate(rate)
                    .ok_or(SplitError::AmountOutOfRange)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let residual = total.scaled() - raw_sum(&shares)?;
        distribute_residual(&mut shares, residual);
        Ok(shares)
    }

    /// Accepts explicit amounts only if they already sum to `total`.
    pub fn exact(
        total: ScaledAmount,
        amounts: &[ScaledAmount],
    ) -> Result<Vec<ScaledAmount>, SplitError> {
        if amounts.is_empty() {
            return Err(SplitError::InvalidParticipantCount);
        }

        let actual = raw_sum(amounts)?;
        if actual != total.scaled() {
            return Err(SplitError::ExactSum {
                expected: total,
                actual: ScaledAmount::from_scaled(actual),
            });
        }
        Ok(amounts.to_vec())
    }

    /// Rescales explicit amounts proportionally so they sum to `total`.
    ///
    /// Amounts that already sum to `total` are returned unchanged.
    pub fn normalize(
        total: ScaledAmount,
        amounts: &[ScaledAmount],
    ) -> Result<Vec<ScaledAmount>, SplitError> {
        if amounts.is_empty() {
            return Err(SplitError::InvalidParticipantCount);
        }

        let current = raw_sum(amounts)?;
        if current == total.scaled() {
            return Ok(amounts.to_vec());
        }
        if current == 0 {
            return Err(SplitError::CannotNormalize { total });
        }

        let current = ScaledAmount::try_from_scaled(current).ok_or(SplitError::AmountOutOfRange)?;
        let mut shares = amounts
            .iter()
            .map(|amount| {
                amount
                    .checked_mul_div(total, current)
                    .ok_or(SplitError::AmountOutOfRange)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let residual = total.scaled() - raw_sum(&shares)?;
        distribute_residual(&mut shares, residual);
        Ok(shares)
    }
}

/// Sums raw scaled values without panicking on oversized user input.
fn raw_sum(amounts: &[ScaledAmount]) -> Result<i64, SplitError> {
    let sum: i128 = amounts.iter().map(|a| i128::from(a.scaled())).sum();
    i64::try_from(sum).map_err(|_| SplitError::AmountOutOfRange)
}

/// Spreads `residual` scaled units over `shares`, first participants first.
///
/// Every share receives `residual / n`; the first `|residual % n|` shares
/// receive one more unit in the residual's direction.
pub(crate) fn distribute_residual(shares: &mut [ScaledAmount], residual: i64) {
    if residual == 0 || shares.is_empty() {
        return;
    }

    let count = i64::try_from(shares.len()).unwrap_or(i64::MAX);
    let per_share = residual / count;
    let extra = residual % count;
    let extra_count = usize::try_from(extra.unsigned_abs()).unwrap_or(usize::MAX);

    for (index, share) in shares.iter_mut().enumerate() {
        let bump = if index < extra_count { extra.signum() } else { 0 };
        *share = ScaledAmount::from_scaled(share.scaled() + per_share + bump);
    }
}
