//! # finpulse-store
//!
//! Owner of the dashboard's live metrics. A single [`MetricsStore`] holds
//! the current state, evolves it one tick at a time with bounded random
//! walks, and publishes each result as an immutable, versioned
//! [`DashboardSnapshot`]. A [`ChurnWatch`] runs beside it on a faster tick,
//! tracing the churn rate with regime shifts and turn markers.
//!
//! ## Architecture
//!
//! ```text
//!   SimulationTicker ──every 30s──▶ MetricsStore::advance_tick()
//!                                        │ lock, evolve, version += 1
//!                                        ▼
//!                         watch::Sender<Arc<DashboardSnapshot>>
//!                                        │
//!                  ┌─────────────────────┼──────────────────────┐
//!                  ▼                     ▼                      ▼
//!             snapshot()           subscribe()         classify_revenue()
//!                                                       kpis() / operational_pulse()
//! ```
//!
//! Readers never block the writer for longer than an `Arc` clone, and a
//! published snapshot is never mutated.

#![deny(unsafe_code)]

pub mod churn;
pub mod config;
pub mod error;
pub mod kpi;
pub mod pulse;
pub mod state;
pub mod store;
pub mod ticker;

// ── Re-exports ──────────────────────────────────────────────────────────

pub use churn::{
    ChurnPoint, ChurnSnapshot, ChurnWatch, ChurnWatchConfig, DEFAULT_CHURN_AVERAGE_WINDOW,
    DEFAULT_CHURN_CAPACITY, DEFAULT_CHURN_TICK_SECS,
};
pub use config::{
    OperationalWalkConfig, RevenueWalkConfig, SimulationConfig, WalkParams,
    DEFAULT_INCIDENT_PROBABILITY, DEFAULT_REVENUE_FLOOR, DEFAULT_REVENUE_WINDOW,
    DEFAULT_TICK_INTERVAL_SECS,
};
pub use error::{StoreError, StoreResult};
pub use kpi::{kpis, Kpi};
pub use pulse::{operational_pulse, overall_status, PulseReading, PulseStatus};
pub use state::{DashboardSnapshot, DashboardState, RevenueSeries};
pub use store::MetricsStore;
pub use ticker::{SimulationTicker, Tickable, TickerHandle};
