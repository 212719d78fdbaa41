//! End-to-end: store ticks feed the rolling baseline and the detector.

use finpulse_anomaly::{AnomalyDetector, AnomalyDetectorConfig, DEFAULT_ROLLING_WINDOW};
use finpulse_store::{
    operational_pulse, DashboardState, MetricsStore, RevenueSeries, SimulationConfig,
};
use finpulse_types::{AllocationSlice, MetricSet, Month, OperationalMetrics, RevenuePoint};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn linear_state() -> DashboardState {
    DashboardState {
        metrics: MetricSet::default(),
        revenue_series: RevenueSeries::from_points(
            Month::ALL
                .iter()
                .take(8)
                .enumerate()
                .map(|(i, m)| {
                    RevenuePoint::new(*m, 40_000.0 + i as f64 * 2_500.0)
                }),
            12,
        ),
        allocation: AllocationSlice::default_breakdown(),
        operational: OperationalMetrics::default(),
    }
}

#[test]
fn ten_ticks_roll_the_window() {
    let store = MetricsStore::with_state(
        SimulationConfig::default(),
        linear_state(),
        StdRng::seed_from_u64(2024),
    )
    .unwrap();

    for _ in 0..10 {
        store.advance_tick();
    }

    let snap = store.snapshot();
    assert_eq!(snap.version, 10);
    assert_eq!(snap.revenue_series.len(), 12);
    assert!(snap.revenue_series.iter().all(|p| p.revenue >= 20_000.0));
    assert!(!snap.revenue_series.iter().any(|p| p.revenue == 40_000.0));
    assert!(!snap.revenue_series.iter().any(|p| p.revenue == 42_500.0));
    let first = snap.revenue_series.first().map(|p| p.month);
    let last = snap.revenue_series.last().map(|p| p.month);
    assert_eq!(first, Some(Month::Jul));
    assert_eq!(last, Some(Month::Jun));

    // Chronological labels: each month follows its predecessor.
    for pair in snap.revenue_series.windows(2) {
        assert_eq!(pair[0].month.next(), pair[1].month);
    }
}

#[test]
fn snapshot_flows_into_detector() {
    let store = MetricsStore::with_seed(SimulationConfig::default(), 77).unwrap();
    for _ in 0..6 {
        store.advance_tick();
    }
    let snap = store.snapshot();

    let detector = AnomalyDetector::default();
    let classified = snap
        .classify_revenue(DEFAULT_ROLLING_WINDOW, &detector)
        .unwrap();
    assert_eq!(classified.len(), snap.revenue_series.len());
    let warm_up = &classified[..2];
    assert!(warm_up.iter().all(|p| p.rolling.is_none()));
    assert!(warm_up.iter().all(|p| !p.is_anomaly));
    for (raw, p) in snap.revenue_series.iter().zip(&classified) {
        assert_eq!(raw.month, p.month);
        assert_eq!(raw.revenue, p.revenue);
        assert_eq!(p.severity.is_some(), p.is_anomaly);
    }

    // A zero threshold can only flag points past the warm-up.
    let eager = AnomalyDetector::new(AnomalyDetectorConfig::with_threshold(0.0)).unwrap();
    let report = snap.anomaly_report(DEFAULT_ROLLING_WINDOW, &eager).unwrap();
    assert_eq!(report.total_points, classified.len());
    assert!(report.anomalies <= snap.revenue_series.len() - 2);
    let by_severity = report.minor + report.moderate + report.major;
    assert_eq!(by_severity, report.anomalies);
}

#[test]
fn pulse_reads_live_operational_block() {
    let store = MetricsStore::with_seed(SimulationConfig::default(), 3).unwrap();
    let snap = store.advance_tick();
    let readings = operational_pulse(&snap.operational);
    assert_eq!(readings.len(), 6);
    assert_eq!(readings[0].key, "uptime");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_walks_stay_in_bounds(seed in any::<u64>(), ticks in 1usize..60) {
        let config = SimulationConfig::default();
        let store = MetricsStore::with_seed(config.clone(), seed).unwrap();
        let mut incidents = 0;
        let mut version = 0;

        for _ in 0..ticks {
            let snap = store.advance_tick();
            let ops = &snap.operational;
            let walks = &config.operational;

            prop_assert!(walks.uptime.contains(ops.uptime));
            prop_assert!(walks.p95_latency.contains(ops.p95_latency));
            prop_assert!(walks.support_backlog.contains(f64::from(ops.support_backlog)));
            prop_assert!(walks.replica_lag_ms.contains(f64::from(ops.replica_lag_ms)));
            prop_assert!(walks.health_score.contains(ops.health_score));

            prop_assert!(ops.security_incidents >= incidents);
            incidents = ops.security_incidents;
            prop_assert_eq!(snap.version, version + 1);
            version = snap.version;

            prop_assert!(snap.revenue_series.len() <= 12);
            prop_assert!(snap.revenue_series.iter().all(|p| p.revenue >= 20_000.0));
        }
        prop_assert_eq!(store.snapshot().revenue_series.len(), (8 + ticks).min(12));
    }
}
