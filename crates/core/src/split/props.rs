//! Property tests for allocation.

use kitty_shared::types::{MAX_MAGNITUDE, ScaledAmount};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::allocation::SplitAllocator;

fn total_of(shares: &[ScaledAmount]) -> i128 {
    shares.iter().map(|s| i128::from(s.scaled())).sum()
}

proptest! {
    #[test]
    fn prop_equal_preserves_total(
        raw in -MAX_MAGNITUDE..=MAX_MAGNITUDE,
        count in 1usize..50,
    ) {
        let total = ScaledAmount::from_scaled(raw);
        let shares = SplitAllocator::equal(total, count).unwrap();
        prop_assert_eq!(shares.len(), count);
        prop_assert_eq!(total_of(&shares), i128::from(raw));
    }

    #[test]
    fn prop_equal_shares_differ_by_at_most_one(
        raw in -MAX_MAGNITUDE..=MAX_MAGNITUDE,
        count in 1usize..50,
    ) {
        let shares = SplitAllocator::equal(ScaledAmount::from_scaled(raw), count).unwrap();
        let max = shares.iter().map(|s| s.scaled()).max().unwrap();
        let min = shares.iter().map(|s| s.scaled()).min().unwrap();
        prop_assert!(max - min <= 1);
        // Earlier participants never receive less than later ones for positive totals.
        if raw >= 0 {
            prop_assert!(shares.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn prop_percentages_preserve_total(
        raw in 0i64..1_000_000_000_000,
        weights in prop::collection::vec(1u32..1_000, 1..10),
    ) {
        // Turn arbitrary weights into percentages with two decimals summing to exactly 100.
        let weight_sum: u32 = weights.iter().sum();
        let mut percentages: Vec<Decimal> = weights
            .iter()
            .map(|w| {
                (Decimal::from(*w) * Decimal::from(100) / Decimal::from(weight_sum)).round_dp(2)
            })
            .collect();
        let drift = Decimal::from(100) - percentages.iter().sum::<Decimal>();
        percentages[0] += drift;
        prop_assume!(percentages.iter().all(|p| !p.is_sign_negative()));

        let total = ScaledAmount::from_scaled(raw);
        let shares = SplitAllocator::by_percentages(total, &percentages).unwrap();
        prop_assert_eq!(total_of(&shares), i128::from(raw));
    }

    #[test]
    fn prop_normalize_preserves_total(
        raw in 0i64..1_000_000_000_000,
        amounts in prop::collection::vec(1i64..1_000_000_000, 1..10),
    ) {
        let amounts: Vec<ScaledAmount> =
            amounts.into_iter().map(ScaledAmount::from_scaled).collect();
        let total = ScaledAmount::from_scaled(raw);
        let shares = SplitAllocator::normalize(total, &amounts).unwrap();
        prop_assert_eq!(shares.len(), amounts.len());
        prop_assert_eq!(total_of(&shares), i128::from(raw));
    }

    #[test]
    fn prop_exact_accepts_own_sum(
        amounts in prop::collection::vec(-1_000_000_000i64..1_000_000_000, 1..10),
    ) {
        let amounts: Vec<ScaledAmount> =
            amounts.into_iter().map(ScaledAmount::from_scaled).collect();
        let total = ScaledAmount::from_scaled(amounts.iter().map(|a| a.scaled()).sum());
        prop_assert_eq!(SplitAllocator::exact(total, &amounts).unwrap(), amounts);
    }
}
