//! Property-based tests for conversion.

use kitty_shared::types::{MAX_MAGNITUDE, MemberId, ScaledAmount};
use proptest::prelude::*;

use super::conversion::ConversionEngine;
use crate::split::{ExactEntry, SplitPolicy};

/// Rates from 0.0001 to 10,000.
fn positive_rate() -> impl Strategy<Value = i64> {
    1i64..100_000_000
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_identity_rate_preserves_amount(raw in -MAX_MAGNITUDE..=MAX_MAGNITUDE) {
        let amount = ScaledAmount::from_scaled(raw);
        prop_assert_eq!(
            ConversionEngine::apply_rate(amount, ConversionEngine::same_currency_rate()),
            amount
        );
    }

    #[test]
    fn prop_converted_shares_sum_to_converted_total(
        raw in 0i64..10_000_000_000,
        rate in positive_rate(),
        members in 1usize..12,
    ) {
        let total = ScaledAmount::from_scaled(raw);
        let policy = SplitPolicy::Equal {
            members: (0..members).map(|_| MemberId::new()).collect(),
        };
        let shares = policy.allocate(total).unwrap();
        let converted = ConversionEngine::convert(total, &shares, ScaledAmount::from_scaled(rate));

        let sum: i64 = converted.shares.iter().map(|s| s.amount_in_main.scaled()).sum();
        prop_assert_eq!(sum, converted.total_in_main.scaled());
    }

    #[test]
    fn prop_reconciled_shares_stay_within_one_unit_per_share(
        raw in 0i64..10_000_000_000,
        rate in positive_rate(),
        weights in proptest::collection::vec(1i64..1_000, 1..8),
    ) {
        let total = ScaledAmount::from_scaled(raw);
        let policy = SplitPolicy::Exact {
            entries: weights
                .iter()
                .map(|w| ExactEntry {
                    member_id: MemberId::new(),
                    amount: ScaledAmount::from_scaled(*w),
                })
                .collect(),
            normalize: true,
        };
        let shares = policy.allocate(total).unwrap();
        let rate = ScaledAmount::from_scaled(rate);
        let converted = ConversionEngine::convert(total, &shares, rate);

        let sum: i64 = converted.shares.iter().map(|s| s.amount_in_main.scaled()).sum();
        prop_assert_eq!(sum, converted.total_in_main.scaled());
        for (share, original) in converted.shares.iter().zip(&shares) {
            let independent = ConversionEngine::apply_rate(original.amount, rate);
            prop_assert!((share.amount_in_main.scaled() - independent.scaled()).abs() <= 1);
        }
    }

    #[test]
    fn prop_conversion_is_sign_symmetric(
        raw in 0i64..10_000_000_000,
        rate in positive_rate(),
    ) {
        let amount = ScaledAmount::from_scaled(raw);
        let rate = ScaledAmount::from_scaled(rate);
        prop_assert_eq!(
            ConversionEngine::apply_rate(-amount, rate),
            -ConversionEngine::apply_rate(amount, rate)
        );
    }
}
