//! Simulation configuration.
//!
//! Every field has a serde default, so a partial file or environment
//! override only needs to name what it changes.

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Reference tick period of the dashboard (seconds).
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 30;

/// Number of months retained in the revenue series.
pub const DEFAULT_REVENUE_WINDOW: usize = 12;

/// Revenue never drops below this many currency units.
pub const DEFAULT_REVENUE_FLOOR: f64 = 20_000.0;

/// Per-tick probability that a new security incident is recorded.
pub const DEFAULT_INCIDENT_PROBABILITY: f64 = 0.01;

/// Parameters of one bounded random walk:
/// `next = clamp(prev + uniform[-scale, scale], min, max)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalkParams {
    pub scale: f64,
    pub min: f64,
    pub max: f64,
}

impl WalkParams {
    pub const fn new(scale: f64, min: f64, max: f64) -> Self {
        Self { scale, min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub(crate) fn validate(&self, field: &str) -> StoreResult<()> {
        if !(self.scale.is_finite() && self.min.is_finite() && self.max.is_finite()) {
            return Err(StoreError::config(field, "walk parameters must be finite"));
        }
        if self.scale < 0.0 {
            return Err(StoreError::config(field, format!("scale {} must be >= 0", self.scale)));
        }
        if self.min > self.max {
            return Err(StoreError::config(field, format!("min {} > max {}", self.min, self.max)));
        }
        // Steps are sampled from [-scale, scale]; the span must be representable.
        if !(2.0 * self.scale).is_finite() {
            return Err(StoreError::config(
                field,
                format!("scale {} overflows the step range", self.scale),
            ));
        }
        Ok(())
    }
}

/// Random-walk parameters for each operational field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperationalWalkConfig {
    #[serde(default = "default_uptime")]
    pub uptime: WalkParams,
    #[serde(default = "default_p95_latency")]
    pub p95_latency: WalkParams,
    #[serde(default = "default_support_backlog")]
    pub support_backlog: WalkParams,
    #[serde(default = "default_replica_lag_ms")]
    pub replica_lag_ms: WalkParams,
    #[serde(default = "default_health_score")]
    pub health_score: WalkParams,
}

impl Default for OperationalWalkConfig {
    fn default() -> Self {
        Self {
            uptime: default_uptime(),
            p95_latency: default_p95_latency(),
            support_backlog: default_support_backlog(),
            replica_lag_ms: default_replica_lag_ms(),
            health_score: default_health_score(),
        }
    }
}

impl OperationalWalkConfig {
    pub fn validate(&self) -> StoreResult<()> {
        self.uptime.validate("operational.uptime")?;
        self.p95_latency.validate("operational.p95_latency")?;
        self.support_backlog.validate("operational.support_backlog")?;
        self.replica_lag_ms.validate("operational.replica_lag_ms")?;
        self.health_score.validate("operational.health_score")?;
        // Integer-valued walks are rounded, then stored as u32.
        for (field, params) in [
            ("operational.support_backlog", &self.support_backlog),
            ("operational.replica_lag_ms", &self.replica_lag_ms),
        ] {
            if params.min < 0.0 || params.max > u32::MAX as f64 {
                return Err(StoreError::config(field, "bounds must fit in u32"));
            }
            if params.min.ceil() > params.max.floor() {
                return Err(StoreError::config(
                    field,
                    format!("no whole number within [{}, {}]", params.min, params.max),
                ));
            }
        }
        Ok(())
    }
}

/// Revenue random walk: `next = max(floor, last + uniform[min_step, max_step])`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevenueWalkConfig {
    /// Maximum number of retained points.
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_floor")]
    pub floor: f64,
    #[serde(default = "default_min_step")]
    pub min_step: f64,
    #[serde(default = "default_max_step")]
    pub max_step: f64,
}

impl Default for RevenueWalkConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            floor: default_floor(),
            min_step: default_min_step(),
            max_step: default_max_step(),
        }
    }
}

impl RevenueWalkConfig {
    pub fn validate(&self) -> StoreResult<()> {
        if self.window == 0 {
            return Err(StoreError::config("revenue.window", "must be at least 1"));
        }
        if !self.floor.is_finite() || self.floor < 0.0 {
            return Err(StoreError::config(
                "revenue.floor",
                format!("{} must be finite and >= 0", self.floor),
            ));
        }
        if !(self.min_step.is_finite() && self.max_step.is_finite()) {
            return Err(StoreError::config("revenue", "steps must be finite"));
        }
        if self.min_step > self.max_step {
            return Err(StoreError::config(
                "revenue",
                format!("min_step {} > max_step {}", self.min_step, self.max_step),
            ));
        }
        if !(self.max_step - self.min_step).is_finite() {
            return Err(StoreError::config("revenue", "step range overflows"));
        }
        Ok(())
    }
}

/// Full configuration for the simulated metrics store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Period between ticks when driven by [`crate::SimulationTicker`].
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
    /// Fixed RNG seed; `None` seeds from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub revenue: RevenueWalkConfig,
    #[serde(default)]
    pub operational: OperationalWalkConfig,
    #[serde(default = "default_incident_probability")]
    pub incident_probability: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: DEFAULT_TICK_INTERVAL_SECS,
            seed: None,
            revenue: RevenueWalkConfig::default(),
            operational: OperationalWalkConfig::default(),
            incident_probability: DEFAULT_INCIDENT_PROBABILITY,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> StoreResult<()> {
        if self.tick_interval_secs == 0 {
            return Err(StoreError::config("tick_interval_secs", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.incident_probability) {
            return Err(StoreError::config(
                "incident_probability",
                format!("{} must be within [0, 1]", self.incident_probability),
            ));
        }
        self.revenue.validate()?;
        self.operational.validate()
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.tick_interval_secs)
    }
}

// Default value helpers
fn default_uptime() -> WalkParams {
    WalkParams::new(0.02, 99.5, 100.0)
}

fn default_p95_latency() -> WalkParams {
    WalkParams::new(12.0, 240.0, 480.0)
}

fn default_support_backlog() -> WalkParams {
    WalkParams::new(3.0, 10.0, 120.0)
}

fn default_replica_lag_ms() -> WalkParams {
    WalkParams::new(8.0, 15.0, 120.0)
}

fn default_health_score() -> WalkParams {
    WalkParams::new(0.15, 6.5, 9.5)
}

fn default_window() -> usize {
    DEFAULT_REVENUE_WINDOW
}

fn default_floor() -> f64 {
    DEFAULT_REVENUE_FLOOR
}

fn default_min_step() -> f64 {
    -2_000.0
}

fn default_max_step() -> f64 {
    4_000.0
}

fn default_tick_interval() -> u64 {
    DEFAULT_TICK_INTERVAL_SECS
}

fn default_incident_probability() -> f64 {
    DEFAULT_INCIDENT_PROBABILITY
}
