//! Store state and published snapshots.
//!
//! `DashboardState` is the mutable payload the store evolves; a
//! `DashboardSnapshot` is one immutable, versioned publication of it.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use finpulse_anomaly::{
    rolling_average, AnomalyDetector, AnomalyPoint, AnomalyReport, AnomalyResult,
};
use finpulse_types::{AllocationSlice, MetricSet, Month, OperationalMetrics, RevenuePoint};
use rand::Rng;
use serde::{Deserialize, Serialize};

// ── Revenue series ──────────────────────────────────────────────────────

/// A bounded, chronologically ordered revenue series.
///
/// Pushing past capacity evicts from the front, so the newest point is
/// always last.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevenueSeries {
    points: VecDeque<RevenuePoint>,
    capacity: usize,
}

impl RevenueSeries {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build from existing points, keeping only the newest `capacity`.
    pub fn from_points(points: impl IntoIterator<Item = RevenuePoint>, capacity: usize) -> Self {
        let mut series = Self::new(capacity);
        for p in points {
            series.push(p);
        }
        series
    }

    /// Append, evicting the oldest point if full.
    pub fn push(&mut self, point: RevenuePoint) {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    /// Change the capacity, trimming from the front if it shrinks.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn last(&self) -> Option<&RevenuePoint> {
        self.points.back()
    }

    /// Month label the next appended point should carry.
    pub fn next_month(&self) -> Month {
        self.last().map_or(Month::Jan, |p| p.month.next())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RevenuePoint> {
        self.points.iter()
    }

    pub fn to_vec(&self) -> Vec<RevenuePoint> {
        self.points.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ── State ───────────────────────────────────────────────────────────────

/// Everything the store owns and evolves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub metrics: MetricSet,
    pub revenue_series: RevenueSeries,
    pub allocation: Vec<AllocationSlice>,
    pub operational: OperationalMetrics,
}

impl DashboardState {
    /// The dashboard's seed state: default KPIs, allocation and ops, plus
    /// eight months (Jan..Aug) of gently rising revenue with jitter.
    pub fn seeded<R: Rng>(rng: &mut R, window: usize) -> Self {
        let points = Month::ALL.iter().take(8).enumerate().map(|(i, m)| {
            let jitter = rng.gen_range(0.0..4_000.0);
            RevenuePoint::new(*m, 40_000.0 + i as f64 * 2_500.0 + jitter)
        });
        Self {
            metrics: MetricSet::default(),
            revenue_series: RevenueSeries::from_points(points, window),
            allocation: AllocationSlice::default_breakdown(),
            operational: OperationalMetrics::default(),
        }
    }
}

// ── Snapshot ────────────────────────────────────────────────────────────

/// One published version of the store state.
///
/// Shared as `Arc<DashboardSnapshot>`; readers never see it change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    /// 0 for the initial state, +1 per published change.
    pub version: u64,
    pub taken_at: DateTime<Utc>,
    pub metrics: MetricSet,
    pub revenue_series: Vec<RevenuePoint>,
    pub allocation: Vec<AllocationSlice>,
    pub operational: OperationalMetrics,
}

impl DashboardSnapshot {
    pub(crate) fn publish(version: u64, state: &DashboardState) -> Arc<Self> {
        Arc::new(Self {
            version,
            taken_at: Utc::now(),
            metrics: state.metrics.clone(),
            revenue_series: state.revenue_series.to_vec(),
            allocation: state.allocation.clone(),
            operational: state.operational.clone(),
        })
    }

    /// Enrich the revenue series with a trailing mean and classify it.
    pub fn classify_revenue(
        &self,
        rolling_window: usize,
        detector: &AnomalyDetector,
    ) -> AnomalyResult<Vec<AnomalyPoint>> {
        let enriched = rolling_average(&self.revenue_series, rolling_window)?;
        Ok(detector.detect(&enriched))
    }

    /// Summary of [`Self::classify_revenue`].
    pub fn anomaly_report(
        &self,
        rolling_window: usize,
        detector: &AnomalyDetector,
    ) -> AnomalyResult<AnomalyReport> {
        Ok(AnomalyReport::from_points(
            &self.classify_revenue(rolling_window, detector)?,
        ))
    }
}
