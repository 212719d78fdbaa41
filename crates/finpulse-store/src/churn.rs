//! Churn watch: a live churn-rate trace with regime shifts and turn markers.
//!
//! Runs beside the [`crate::MetricsStore`] on its own, faster tick. Each
//! tick random-walks the churn rate with a step that widens after every
//! regime shift, keeps a short trailing average, and labels up to
//! `max_markers` sharp reversals `A`, `B`, `C`, ...

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::WalkParams;
use crate::error::{StoreError, StoreResult};
use crate::store::drift;

/// Seconds between churn ticks (the dashboard jitters between 4 and 6).
pub const DEFAULT_CHURN_TICK_SECS: u64 = 5;

/// Maximum number of retained churn points.
pub const DEFAULT_CHURN_CAPACITY: usize = 60;

/// Points in the trailing average, the newest included.
pub const DEFAULT_CHURN_AVERAGE_WINDOW: usize = 6;

/// Configuration of the churn watch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChurnWatchConfig {
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
    /// Fixed RNG seed; `None` seeds from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Start ticking immediately; a paused watch ignores ticks.
    #[serde(default = "default_live")]
    pub live: bool,
    /// Length of the seeded history.
    #[serde(default = "default_initial_points")]
    pub initial_points: usize,
    #[serde(default = "default_initial_value")]
    pub initial_value: f64,
    /// Walk used only to seed the history.
    #[serde(default = "default_initial_walk")]
    pub initial_walk: WalkParams,
    /// Live step scale: `base_scale + regime * regime_scale`.
    #[serde(default = "default_base_scale")]
    pub base_scale: f64,
    #[serde(default = "default_regime_scale")]
    pub regime_scale: f64,
    #[serde(default = "default_min")]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
    #[serde(default = "default_regime_shift_probability")]
    pub regime_shift_probability: f64,
    /// A regime shift adds `uniform[-regime_jump, regime_jump]`.
    #[serde(default = "default_regime_jump")]
    pub regime_jump: f64,
    #[serde(default = "default_average_window")]
    pub average_window: usize,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Minimum absolute step for a reversal to be marked.
    #[serde(default = "default_marker_slope")]
    pub marker_slope: f64,
    /// Markers ever assigned; at most 26.
    #[serde(default = "default_max_markers")]
    pub max_markers: u32,
}

impl Default for ChurnWatchConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: DEFAULT_CHURN_TICK_SECS,
            seed: None,
            live: true,
            initial_points: default_initial_points(),
            initial_value: default_initial_value(),
            initial_walk: default_initial_walk(),
            base_scale: default_base_scale(),
            regime_scale: default_regime_scale(),
            min: default_min(),
            max: default_max(),
            regime_shift_probability: default_regime_shift_probability(),
            regime_jump: default_regime_jump(),
            average_window: DEFAULT_CHURN_AVERAGE_WINDOW,
            capacity: DEFAULT_CHURN_CAPACITY,
            marker_slope: default_marker_slope(),
            max_markers: default_max_markers(),
        }
    }
}

impl ChurnWatchConfig {
    pub fn validate(&self) -> StoreResult<()> {
        if !(1..=3_600).contains(&self.tick_interval_secs) {
            return Err(StoreError::config(
                "churn.tick_interval_secs",
                "must be within [1, 3600]",
            ));
        }
        if self.average_window == 0 {
            return Err(StoreError::config("churn.average_window", "must be at least 1"));
        }
        if self.capacity == 0 {
            return Err(StoreError::config("churn.capacity", "must be at least 1"));
        }
        if self.max_markers > 26 {
            return Err(StoreError::config("churn.max_markers", "must be at most 26"));
        }
        if !self.initial_value.is_finite() {
            return Err(StoreError::config("churn.initial_value", "must be finite"));
        }
        self.initial_walk.validate("churn.initial_walk")?;
        WalkParams::new(self.base_scale, self.min, self.max)
            .validate("churn")?;
        if !(2.0 * self.regime_jump).is_finite() || self.regime_jump < 0.0 {
            return Err(StoreError::config(
                "churn.regime_jump",
                format!("{} must be finite and >= 0", self.regime_jump),
            ));
        }
        if !self.regime_scale.is_finite() || self.regime_scale < 0.0 {
            return Err(StoreError::config(
                "churn.regime_scale",
                format!("{} must be finite and >= 0", self.regime_scale),
            ));
        }
        if !(0.0..=1.0).contains(&self.regime_shift_probability) {
            return Err(StoreError::config(
                "churn.regime_shift_probability",
                format!("{} must be within [0, 1]", self.regime_shift_probability),
            ));
        }
        if !self.marker_slope.is_finite() || self.marker_slope < 0.0 {
            return Err(StoreError::config(
                "churn.marker_slope",
                format!("{} must be finite and >= 0", self.marker_slope),
            ));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}

// Default value helpers
fn default_tick_interval() -> u64 {
    DEFAULT_CHURN_TICK_SECS
}

fn default_live() -> bool {
    true
}

fn default_initial_points() -> usize {
    20
}

fn default_initial_value() -> f64 {
    5.0
}

fn default_initial_walk() -> WalkParams {
    WalkParams::new(0.25, 2.0, 12.0)
}

fn default_base_scale() -> f64 {
    0.35
}

fn default_regime_scale() -> f64 {
    0.2
}

fn default_min() -> f64 {
    1.5
}

fn default_max() -> f64 {
    15.0
}

fn default_regime_shift_probability() -> f64 {
    0.05
}

fn default_regime_jump() -> f64 {
    2.5
}

fn default_average_window() -> usize {
    DEFAULT_CHURN_AVERAGE_WINDOW
}

fn default_capacity() -> usize {
    DEFAULT_CHURN_CAPACITY
}

fn default_marker_slope() -> f64 {
    0.9
}

fn default_max_markers() -> u32 {
    3
}

// ── Points and snapshots ────────────────────────────────────────────────

/// One sample of the churn trace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChurnPoint {
    /// Monotonic sample index; survives eviction.
    pub idx: u64,
    /// Churn rate in percent, two decimals.
    pub churn: f64,
    /// Trailing average, two decimals.
    pub avg: f64,
    /// Regime in force when the point was taken.
    pub regime: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<char>,
    pub ts: DateTime<Utc>,
}

/// One published version of the churn trace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurnSnapshot {
    pub version: u64,
    pub taken_at: DateTime<Utc>,
    pub points: Vec<ChurnPoint>,
    pub regime: u32,
    /// Markers assigned so far, including any already evicted.
    pub markers_assigned: u32,
}

impl ChurnSnapshot {
    pub fn latest(&self) -> Option<&ChurnPoint> {
        self.points.last()
    }

    /// Marked points still in the window.
    pub fn markers(&self) -> impl Iterator<Item = &ChurnPoint> {
        self.points.iter().filter(|p| p.marker.is_some())
    }
}

// ── Watch ───────────────────────────────────────────────────────────────

struct ChurnInner {
    points: VecDeque<ChurnPoint>,
    regime: u32,
    markers_assigned: u32,
    version: u64,
    rng: Box<dyn RngCore + Send>,
}

impl ChurnInner {
    fn publish(&self) -> Arc<ChurnSnapshot> {
        Arc::new(ChurnSnapshot {
            version: self.version,
            taken_at: Utc::now(),
            points: self.points.iter().cloned().collect(),
            regime: self.regime,
            markers_assigned: self.markers_assigned,
        })
    }
}

/// Live churn-rate trace. Share it as `Arc<ChurnWatch>`.
pub struct ChurnWatch {
    config: ChurnWatchConfig,
    inner: Mutex<ChurnInner>,
    snapshot_tx: watch::Sender<Arc<ChurnSnapshot>>,
    live: AtomicBool,
    closed: AtomicBool,
}

impl ChurnWatch {
    /// Uses `config.seed` when set, OS entropy otherwise.
    pub fn new(config: ChurnWatchConfig) -> StoreResult<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    pub fn with_seed(config: ChurnWatchConfig, seed: u64) -> StoreResult<Self> {
        Self::new(ChurnWatchConfig {
            seed: Some(seed),
            ..config
        })
    }

    /// Seed the history from `rng`, then keep drawing from it on every tick.
    pub fn with_rng(
        config: ChurnWatchConfig,
        mut rng: impl RngCore + Send + 'static,
    ) -> StoreResult<Self> {
        config.validate()?;

        let points = seed_history(&config, &mut rng);
        let inner = ChurnInner {
            points,
            regime: 0,
            markers_assigned: 0,
            version: 0,
            rng: Box::new(rng),
        };
        let (snapshot_tx, _) = watch::channel(inner.publish());

        debug!(
            points = inner.points.len(),
            capacity = config.capacity,
            "churn watch created"
        );

        Ok(Self {
            live: AtomicBool::new(config.live),
            config,
            inner: Mutex::new(inner),
            snapshot_tx,
            closed: AtomicBool::new(false),
        })
    }

    pub fn snapshot(&self) -> Arc<ChurnSnapshot> {
        self.snapshot_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ChurnSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    pub fn config(&self) -> &ChurnWatchConfig {
        &self.config
    }

    pub fn version(&self) -> u64 {
        self.snapshot_tx.borrow().version
    }

    /// Append one churn point and publish.
    ///
    /// A paused or closed watch returns the unchanged snapshot.
    pub fn advance_tick(&self) -> Arc<ChurnSnapshot> {
        let mut guard = self.lock_inner();
        if self.is_closed() || !self.is_live() {
            return self.snapshot();
        }

        let inner = &mut *guard;
        let config = &self.config;
        let Some(last) = inner.points.back().cloned() else {
            return self.snapshot();
        };

        let scale = config.base_scale + f64::from(inner.regime) * config.regime_scale;
        let mut next = last.churn + symmetric_step(&mut inner.rng, scale);
        if inner.rng.gen_bool(config.regime_shift_probability) {
            inner.regime = inner.regime.saturating_add(1);
            next += symmetric_step(&mut inner.rng, config.regime_jump);
            info!(regime = inner.regime, "churn regime shift");
        }
        let next = if next.is_finite() {
            next.clamp(config.min, config.max)
        } else {
            (config.min + config.max) / 2.0
        };

        // Trailing mean over the stored (rounded) neighbours and the raw new value.
        let window = config.average_window - 1;
        let recent = inner.points.iter().rev().take(window);
        let count = recent.len() + 1;
        let avg = (recent.map(|p| p.churn).sum::<f64>() + next) / count as f64;

        let slope = next - last.churn;
        let previous = inner.points.iter().rev().nth(1);
        let reversal = previous.map_or(true, |p| {
            direction(slope) != direction(last.churn - p.churn)
        });
        let marker = if inner.markers_assigned < config.max_markers
            && slope.abs() > config.marker_slope
            && reversal
        {
            let letter = char::from(b'A' + inner.markers_assigned as u8);
            inner.markers_assigned += 1;
            info!(
                marker = %letter,
                idx = last.idx + 1,
                churn = round2(next),
                "churn turn marked"
            );
            Some(letter)
        } else {
            None
        };

        inner.points.push_back(ChurnPoint {
            idx: last.idx + 1,
            churn: round2(next),
            avg: round2(avg),
            regime: inner.regime,
            marker,
            ts: Utc::now(),
        });
        while inner.points.len() > config.capacity {
            inner.points.pop_front();
        }

        inner.version += 1;
        let snapshot = inner.publish();
        self.snapshot_tx.send_replace(snapshot.clone());

        debug!(
            version = inner.version,
            churn = round2(next),
            regime = inner.regime,
            "churn tick advanced"
        );
        snapshot
    }

    /// Pause or resume the trace without stopping its ticker.
    pub fn set_live(&self, live: bool) {
        if self.live.swap(live, Ordering::SeqCst) != live {
            debug!(live, "churn watch toggled");
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Stop accepting ticks. Readers keep the last snapshot.
    pub fn close(&self) {
        let _guard = self.lock_inner();
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!(version = self.version(), "churn watch closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn lock_inner(&self) -> MutexGuard<'_, ChurnInner> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("churn watch lock poisoned; recovering last state");
            poisoned.into_inner()
        })
    }
}

impl std::fmt::Debug for ChurnWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChurnWatch")
            .field("version", &self.version())
            .field("live", &self.is_live())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

fn seed_history<R: Rng>(config: &ChurnWatchConfig, rng: &mut R) -> VecDeque<ChurnPoint> {
    let count = config.initial_points.clamp(1, config.capacity);
    let spacing = chrono::Duration::seconds(config.tick_interval_secs as i64);
    let now = Utc::now();
    let mut value = config.initial_value;
    (0..count)
        .map(|i| {
            value = drift(rng, value, &config.initial_walk);
            ChurnPoint {
                idx: i as u64,
                churn: round2(value),
                avg: round2(value),
                regime: 0,
                marker: None,
                ts: now - spacing * i32::try_from(count - i).unwrap_or(i32::MAX),
            }
        })
        .collect()
}

/// `uniform[-scale, scale]`, or 0 when the span is empty or unrepresentable.
fn symmetric_step<R: Rng>(rng: &mut R, scale: f64) -> f64 {
    if scale > 0.0 && (2.0 * scale).is_finite() {
        rng.gen_range(-scale..=scale)
    } else {
        0.0
    }
}

/// -1, 0 or 1; zero has no direction.
fn direction(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
