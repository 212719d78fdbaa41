//! Churn watch properties over arbitrary seeds and tick counts.

use finpulse_store::{ChurnWatch, ChurnWatchConfig};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn churn_stays_in_bounds(seed in any::<u64>(), ticks in 1usize..150) {
        let config = ChurnWatchConfig::default();
        let watch = ChurnWatch::with_seed(config.clone(), seed).unwrap();

        for _ in 0..ticks {
            let snap = watch.advance_tick();
            prop_assert!(snap.points.len() <= config.capacity);
            for p in &snap.points {
                prop_assert!(p.churn >= config.min && p.churn <= config.max);
                prop_assert!(p.avg >= config.min && p.avg <= config.max);
            }
        }
        let snap = watch.snapshot();
        prop_assert_eq!(snap.points.len(), (config.initial_points + ticks).min(config.capacity));
        prop_assert_eq!(snap.version, ticks as u64);
    }

    #[test]
    fn indices_are_contiguous(seed in any::<u64>(), ticks in 0usize..120) {
        let watch = ChurnWatch::with_seed(ChurnWatchConfig::default(), seed).unwrap();
        for _ in 0..ticks {
            watch.advance_tick();
        }
        let snap = watch.snapshot();
        for pair in snap.points.windows(2) {
            prop_assert_eq!(pair[1].idx, pair[0].idx + 1);
        }
        let last = snap.latest().map(|p| p.idx);
        prop_assert_eq!(last, Some((19 + ticks) as u64));
    }

    #[test]
    fn at_most_three_markers(seed in any::<u64>(), slope in 0.0f64..1.5) {
        let config = ChurnWatchConfig {
            marker_slope: slope,
            regime_shift_probability: 0.25,
            ..ChurnWatchConfig::default()
        };
        let watch = ChurnWatch::with_seed(config, seed).unwrap();
        let mut seen = Vec::new();

        for _ in 0..120 {
            let snap = watch.advance_tick();
            prop_assert!(snap.markers_assigned <= 3);
            prop_assert!(snap.markers().count() <= 3);
            if let Some(marker) = snap.latest().and_then(|p| p.marker) {
                seen.push(marker);
            }
            let regimes_rise = snap.points.windows(2).all(|w| w[0].regime <= w[1].regime);
            prop_assert!(regimes_rise);
        }

        // Letters are handed out in order and never reused.
        let expected: Vec<char> = ['A', 'B', 'C'].into_iter().take(seen.len()).collect();
        prop_assert_eq!(seen.len() as u32, watch.snapshot().markers_assigned);
        prop_assert_eq!(seen, expected);
    }
}
