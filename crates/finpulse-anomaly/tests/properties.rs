//! Property tests: the detector is a pure, shape-preserving classification.

use finpulse_anomaly::{
    detect_anomalies, rolling_average, RollingPoint, Severity, DEFAULT_ROLLING_WINDOW,
    DEFAULT_THRESHOLD,
};
use finpulse_types::{Month, RevenuePoint};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_rolling_point() -> impl Strategy<Value = RollingPoint> {
    (
        0usize..12,
        0.0f64..200_000.0,
        prop_oneof![
            Just(None),
            Just(Some(0.0)),
            (1.0f64..200_000.0).prop_map(Some),
        ],
    )
        .prop_map(|(m, revenue, rolling)| {
            RollingPoint::new(Month::from_index(m), revenue, rolling)
        })
}

fn arb_series(max: usize) -> impl Strategy<Value = Vec<RevenuePoint>> {
    prop::collection::vec(20_000.0f64..120_000.0, 0..max).prop_map(|values| {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| RevenuePoint::new(Month::from_index(i), v))
            .collect()
    })
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn detection_is_referentially_transparent(
        points in prop::collection::vec(arb_rolling_point(), 0..24),
        threshold in 0.0f64..1.0,
    ) {
        let first = detect_anomalies(&points, threshold);
        let second = detect_anomalies(&points, threshold);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn detection_preserves_shape(points in prop::collection::vec(arb_rolling_point(), 0..24)) {
        let out = detect_anomalies(&points, DEFAULT_THRESHOLD);
        prop_assert_eq!(out.len(), points.len());
        for (input, classified) in points.iter().zip(&out) {
            prop_assert_eq!(input.month, classified.month);
            prop_assert_eq!(input.revenue, classified.revenue);
            prop_assert_eq!(input.rolling, classified.rolling);
        }
    }

    #[test]
    fn severity_present_iff_anomalous(points in prop::collection::vec(arb_rolling_point(), 0..24)) {
        for p in detect_anomalies(&points, DEFAULT_THRESHOLD) {
            prop_assert_eq!(p.severity.is_some(), p.is_anomaly);
            if p.is_anomaly {
                prop_assert!(p.deviation_pct.abs() > DEFAULT_THRESHOLD * 100.0 - 1e-9);
                prop_assert!(p.direction.is_some());
            }
        }
    }

    #[test]
    fn degenerate_baselines_are_neutral(revenue in 0.0f64..200_000.0, zero in any::<bool>()) {
        let rolling = if zero { Some(0.0) } else { None };
        let input = [RollingPoint::new(Month::Jan, revenue, rolling)];
        let out = detect_anomalies(&input, DEFAULT_THRESHOLD);
        prop_assert!(!out[0].is_anomaly);
        prop_assert_eq!(out[0].deviation_pct, 0.0);
        prop_assert!(out[0].direction.is_none());
        prop_assert!(out[0].severity.is_none());
    }

    #[test]
    fn major_only_beyond_major_band(points in prop::collection::vec(arb_rolling_point(), 1..24)) {
        for p in detect_anomalies(&points, DEFAULT_THRESHOLD) {
            if p.severity == Some(Severity::Major) {
                prop_assert!(p.deviation_pct.abs() > 35.0 - 1e-9);
            }
        }
    }

    #[test]
    fn rolling_warm_up_matches_window(series in arb_series(16)) {
        let enriched = rolling_average(&series, DEFAULT_ROLLING_WINDOW).unwrap();
        prop_assert_eq!(enriched.len(), series.len());
        for (i, p) in enriched.iter().enumerate() {
            prop_assert_eq!(p.rolling.is_none(), i + 1 < DEFAULT_ROLLING_WINDOW);
            if let Some(r) = p.rolling {
                let lo = series[i + 1 - DEFAULT_ROLLING_WINDOW..=i]
                    .iter()
                    .map(|q| q.revenue)
                    .fold(f64::INFINITY, f64::min);
                let hi = series[i + 1 - DEFAULT_ROLLING_WINDOW..=i]
                    .iter()
                    .map(|q| q.revenue)
                    .fold(f64::NEG_INFINITY, f64::max);
                prop_assert!(r >= lo.floor() && r <= hi.ceil());
            }
        }
    }
}
