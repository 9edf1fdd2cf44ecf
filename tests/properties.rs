//! Property tests for the classifier and the chain generator.

use fno_analytics::prelude::*;
use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

/// Any valid candle: `0 <= low <= min(open, close) <= max(open, close) <= high`
fn candle() -> impl Strategy<Value = Candle> {
    (1.0f64..10_000.0, 0.0f64..1.0, 0.0f64..1.0, 0.0f64..500.0).prop_map(
        |(low, a, b, range)| {
            let high = low + range;
            Candle::new(low + a * range, high, low, low + b * range)
        },
    )
}

proptest! {
    #[test]
    fn classification_is_never_empty(c in candle(), p in candle(), p2 in candle()) {
        let result = classify_candlestick_patterns(&c, Some(&p), Some(&p2)).unwrap();
        prop_assert!(!result.is_empty());
        if result.iter().any(PatternMatch::is_no_pattern) {
            prop_assert_eq!(result.len(), 1);
        }
    }

    #[test]
    fn classification_is_pure(c in candle(), p in candle()) {
        let a = classify_candlestick_patterns(&c, Some(&p), None).unwrap();
        let b = classify_candlestick_patterns(&c, Some(&p), None).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn categories_match_builtin_tags(c in candle(), p in candle(), p2 in candle()) {
        for m in classify_candlestick_patterns(&c, Some(&p), Some(&p2)).unwrap() {
            prop_assert_eq!(m.pattern_type.typical_direction(), Some(m.category));
        }
    }

    #[test]
    fn flat_candle_is_sentinel(price in 0.0f64..100_000.0) {
        let c = Candle::new(price, price, price, price);
        let result = classify_candlestick_patterns(&c, None, None).unwrap();
        prop_assert_eq!(result, vec![PatternMatch::no_pattern()]);
    }

    #[test]
    fn chain_ladder_invariants(
        spot in 100.0f64..100_000.0,
        iv in 5.0f64..40.0,
        strikes in 1u32..20,
        step in 1i64..500,
        seed in any::<u64>(),
    ) {
        let generator = OptionChainGenerator::try_new(
            ChainConfig::default()
                .with_strike_count(strikes)
                .with_step(StepRule::Fixed(step)),
        )
        .unwrap();
        let chain = generator.build(spot, iv, &mut StdRng::seed_from_u64(seed)).unwrap();

        prop_assert_eq!(chain.len(), 2 * strikes as usize + 1);
        prop_assert!(chain.rows.windows(2).all(|w| w[1].strike - w[0].strike == step));
        prop_assert_eq!(chain.rows.iter().filter(|r| r.is_atm).count(), 1);
        prop_assert_eq!(chain.atm_strike % step, 0);
        prop_assert!((chain.atm_strike as f64 - spot).abs() <= step as f64 / 2.0 + 1e-6);
    }

    #[test]
    fn same_seed_same_chain(spot in 100.0f64..60_000.0, seed in any::<u64>()) {
        let a = build_option_chain(spot, 14.0, &mut StdRng::seed_from_u64(seed)).unwrap();
        let b = build_option_chain(spot, 14.0, &mut StdRng::seed_from_u64(seed)).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn expected_oi_decays_with_distance(near in 0.0f64..1.0, extra in 0.0f64..1.0) {
        for config in [ChainConfig::default(), ChainConfig::seeded()] {
            let far = near + extra;
            prop_assert!(config.expected_open_interest(far) <= config.expected_open_interest(near));
        }
    }

    #[test]
    fn open_extreme_proximity_within_threshold(c in candle(), threshold in 0.0f64..5.0) {
        if let Some((extreme, proximity)) = open_extreme_signal(&c, threshold).unwrap() {
            prop_assert!(proximity <= threshold);
            prop_assert_eq!(proximity, extreme.proximity_pct(&c));
        }
    }
}
