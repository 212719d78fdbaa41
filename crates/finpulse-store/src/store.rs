//! The metrics store: single writer of the dashboard snapshot.
//!
//! Hot path: `advance_tick()` locks, evolves the state in place and publishes one
//! new `Arc<DashboardSnapshot>` through a watch channel. Readers only ever
//! see complete snapshots; the lock serializes ticks so at most one
//! transition is in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use finpulse_types::{MetricSet, OperationalMetrics, RevenuePoint};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::{SimulationConfig, WalkParams};
use crate::error::{StoreError, StoreResult};
use crate::state::{DashboardSnapshot, DashboardState, RevenueSeries};

type BoxedRng = Box<dyn RngCore + Send>;

struct StoreInner {
    state: DashboardState,
    version: u64,
    rng: BoxedRng,
}

/// Process-wide dashboard metrics, evolved by bounded random walks.
///
/// Share it as `Arc<MetricsStore>`; every method takes `&self`.
pub struct MetricsStore {
    config: SimulationConfig,
    inner: Mutex<StoreInner>,
    snapshot_tx: watch::Sender<Arc<DashboardSnapshot>>,
    closed: AtomicBool,
}

impl MetricsStore {
    /// Create a store with the seed dashboard state.
    ///
    /// Uses `config.seed` when set, OS entropy otherwise.
    pub fn new(config: SimulationConfig) -> StoreResult<Self> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let state = DashboardState::seeded(&mut rng, config.revenue.window);
        Self::with_state(config, state, rng)
    }

    /// Create a store with a deterministic RNG.
    pub fn with_seed(config: SimulationConfig, seed: u64) -> StoreResult<Self> {
        Self::new(SimulationConfig {
            seed: Some(seed),
            ..config
        })
    }

    /// Create a store from an explicit initial state and random source.
    pub fn with_state(
        config: SimulationConfig,
        mut state: DashboardState,
        rng: impl RngCore + Send + 'static,
    ) -> StoreResult<Self> {
        config.validate()?;
        validate_metrics(&state.metrics)?;
        validate_series(&state.revenue_series)?;
        state.revenue_series.set_capacity(config.revenue.window);

        let initial = DashboardSnapshot::publish(0, &state);
        let (snapshot_tx, _) = watch::channel(initial);

        debug!(
            points = state.revenue_series.len(),
            window = config.revenue.window,
            "metrics store created"
        );

        Ok(Self {
            config,
            inner: Mutex::new(StoreInner {
                state,
                version: 0,
                rng: Box::new(rng),
            }),
            snapshot_tx,
            closed: AtomicBool::new(false),
        })
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        self.snapshot_tx.borrow().clone()
    }

    /// Receive every snapshot published from now on.
    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Version of the current snapshot.
    pub fn version(&self) -> u64 {
        self.snapshot_tx.borrow().version
    }

    /// Advance the simulation by one tick and publish the result.
    ///
    /// 1. Append next month's revenue (`max(floor, last + step)`), evicting
    ///    beyond the window
    /// 2. Random-walk every operational field within its bounds
    /// 3. Occasionally record a security incident
    ///
    /// Never fails. Once the store is closed this is a no-op that returns
    /// the unchanged snapshot.
    pub fn advance_tick(&self) -> Arc<DashboardSnapshot> {
        let mut guard = self.lock_inner();
        if self.is_closed() {
            return self.snapshot();
        }

        let inner = &mut *guard;
        let point =
            next_revenue_point(&self.config, &inner.state.revenue_series, &mut inner.rng);
        inner.state.revenue_series.push(point);

        let previous_incidents = inner.state.operational.security_incidents;
        inner.state.operational =
            step_operational(&self.config, &inner.state.operational, &mut inner.rng);
        if inner.rng.gen_bool(self.config.incident_probability) {
            inner.state.operational.security_incidents = previous_incidents.saturating_add(1);
            info!(
                incidents = inner.state.operational.security_incidents,
                "security incident recorded"
            );
        }

        inner.version += 1;
        let snapshot = DashboardSnapshot::publish(inner.version, &inner.state);
        self.snapshot_tx.send_replace(snapshot.clone());

        debug!(
            version = inner.version,
            month = %point.month,
            revenue = point.revenue,
            "tick advanced"
        );
        snapshot
    }

    /// Replace the headline KPI block and publish a new version.
    pub fn set_metrics(&self, metrics: MetricSet) -> StoreResult<Arc<DashboardSnapshot>> {
        validate_metrics(&metrics)?;

        let mut guard = self.lock_inner();
        let inner = &mut *guard;
        inner.state.metrics = metrics;
        inner.version += 1;
        let snapshot = DashboardSnapshot::publish(inner.version, &inner.state);
        self.snapshot_tx.send_replace(snapshot.clone());
        Ok(snapshot)
    }

    /// Stop accepting ticks. Readers keep the last snapshot.
    pub fn close(&self) {
        let _guard = self.lock_inner();
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!(version = self.version(), "metrics store closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn lock_inner(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("metrics store lock poisoned; recovering last state");
            poisoned.into_inner()
        })
    }
}

impl std::fmt::Debug for MetricsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsStore")
            .field("version", &self.version())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// ── Transition rules ────────────────────────────────────────────────────

fn next_revenue_point<R: Rng>(
    config: &SimulationConfig,
    series: &RevenueSeries,
    rng: &mut R,
) -> RevenuePoint {
    let walk = &config.revenue;
    let last = series.last().map_or(walk.floor, |p| p.revenue);
    let step = rng.gen_range(walk.min_step..=walk.max_step);
    let revenue = (last + step).max(walk.floor);
    let revenue = if revenue.is_finite() { revenue } else { walk.floor };
    RevenuePoint::new(series.next_month(), revenue)
}

fn step_operational<R: Rng>(
    config: &SimulationConfig,
    ops: &OperationalMetrics,
    rng: &mut R,
) -> OperationalMetrics {
    let walks = &config.operational;
    OperationalMetrics {
        uptime: drift(rng, ops.uptime, &walks.uptime),
        p95_latency: drift(rng, ops.p95_latency, &walks.p95_latency),
        security_incidents: ops.security_incidents,
        support_backlog: drift_whole(rng, ops.support_backlog, &walks.support_backlog),
        replica_lag_ms: drift_whole(rng, ops.replica_lag_ms, &walks.replica_lag_ms),
        health_score: drift_tenths(rng, ops.health_score, &walks.health_score),
    }
}

/// `clamp(value + uniform[-scale, scale], min, max)`.
///
/// A non-finite intermediate resets to the midpoint of the range.
pub(crate) fn drift<R: Rng>(rng: &mut R, value: f64, params: &WalkParams) -> f64 {
    let step = if params.scale > 0.0 {
        rng.gen_range(-params.scale..=params.scale)
    } else {
        0.0
    };
    let next = value + step;
    if next.is_finite() {
        next.clamp(params.min, params.max)
    } else {
        (params.min + params.max) / 2.0
    }
}

fn drift_whole<R: Rng>(rng: &mut R, value: u32, params: &WalkParams) -> u32 {
    drift(rng, f64::from(value), params)
        .round()
        .clamp(params.min.ceil(), params.max.floor()) as u32
}

fn drift_tenths<R: Rng>(rng: &mut R, value: f64, params: &WalkParams) -> f64 {
    ((drift(rng, value, params) * 10.0).round() / 10.0).clamp(params.min, params.max)
}

fn validate_series(series: &RevenueSeries) -> StoreResult<()> {
    match series
        .iter()
        .find(|p| !p.revenue.is_finite() || p.revenue < 0.0)
    {
        Some(p) => Err(StoreError::InvalidRevenue {
            month: p.month,
            value: p.revenue,
        }),
        None => Ok(()),
    }
}

fn validate_metrics(m: &MetricSet) -> StoreResult<()> {
    let non_negative = [("revenue", m.revenue), ("arr", m.arr)];
    for (field, value) in non_negative {
        if !value.is_finite() || value < 0.0 {
            return Err(StoreError::InvalidMetrics {
                field,
                value,
                detail: "must be finite and >= 0",
            });
        }
    }
    if !(0.0..=100.0).contains(&m.churn) {
        return Err(StoreError::InvalidMetrics {
            field: "churn",
            value: m.churn,
            detail: "must be within [0, 100]",
        });
    }
    let deltas = [
        ("revenue_delta", m.revenue_delta),
        ("customers_delta", m.customers_delta),
        ("arr_delta", m.arr_delta),
        ("churn_delta", m.churn_delta),
    ];
    for (field, value) in deltas {
        if !value.is_finite() {
            return Err(StoreError::InvalidMetrics {
                field,
                value,
                detail: "must be finite",
            });
        }
    }
    Ok(())
}
