//! # finpulse-anomaly
//!
//! Revenue anomaly detection against a rolling baseline.
//!
//! ## Architecture
//!
//! ```text
//!   [RevenuePoint]
//!       │ rolling_average(window = 3)
//!       ▼
//!   [RollingPoint]        ← trailing mean, None during warm-up
//!       │ detect_anomalies(threshold = 0.18)
//!       ▼
//!   [AnomalyPoint]        ← is_anomaly, deviation_pct, direction, severity
//!       │ AnomalyReport::from_points
//!       ▼
//!   AnomalyReport         ← counts per severity, largest deviation
//! ```
//!
//! Everything in this crate is a pure function of its input: no shared
//! state, no clock, no randomness.
//!
//! ## Quick Start
//!
//! ```rust
//! use finpulse_anomaly::{detect_anomalies, rolling_average, Severity, DEFAULT_THRESHOLD};
//! use finpulse_types::{Month, RevenuePoint};
//!
//! let series = vec![
//!     RevenuePoint::new(Month::Jan, 40_000.0),
//!     RevenuePoint::new(Month::Feb, 41_000.0),
//!     RevenuePoint::new(Month::Mar, 42_000.0),
//!     RevenuePoint::new(Month::Apr, 65_000.0),
//! ];
//! let enriched = rolling_average(&series, 3).unwrap();
//! let classified = detect_anomalies(&enriched, DEFAULT_THRESHOLD);
//!
//! assert!(!classified[0].is_anomaly);
//! assert!(classified[3].is_anomaly);
//! assert_eq!(classified[3].severity, Some(Severity::Moderate));
//! ```

#![deny(unsafe_code)]

pub mod detector;
pub mod error;
pub mod report;
pub mod rolling;
pub mod types;

// ── Re-exports ──────────────────────────────────────────────────────────

pub use detector::{detect_anomalies, AnomalyDetector};
pub use error::{AnomalyError, AnomalyResult};
pub use report::AnomalyReport;
pub use rolling::{rolling_average, RollingPoint, DEFAULT_ROLLING_WINDOW};
pub use types::{
    AnomalyDetectorConfig, AnomalyPoint, Direction, Severity, DEFAULT_MAJOR_ABOVE,
    DEFAULT_MODERATE_ABOVE, DEFAULT_THRESHOLD,
};
