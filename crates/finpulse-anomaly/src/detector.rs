//! Deviation scoring against the rolling baseline.
//!
//! Each point is classified independently:
//!
//! ```text
//!   deviation = (revenue - rolling) / rolling
//!   anomaly   = |deviation| >  threshold
//!   severity  = |deviation| >  major_above    → Major
//!             | |deviation| >  moderate_above → Moderate
//!             | otherwise                     → Minor
//! ```
//!
//! All comparisons are strict, so a deviation exactly on a boundary falls
//! into the lower class.

use crate::error::AnomalyResult;
use crate::rolling::RollingPoint;
use crate::types::{AnomalyDetectorConfig, AnomalyPoint, Direction, Severity};

/// Stateless revenue anomaly classifier.
#[derive(Clone, Debug, Default)]
pub struct AnomalyDetector {
    config: AnomalyDetectorConfig,
}

impl AnomalyDetector {
    /// Create a detector, rejecting an invalid configuration.
    pub fn new(config: AnomalyDetectorConfig) -> AnomalyResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnomalyDetectorConfig {
        &self.config
    }

    /// Classify every point. Output is 1:1 with the input, in order.
    pub fn detect(&self, points: &[RollingPoint]) -> Vec<AnomalyPoint> {
        points.iter().map(|p| self.classify(p)).collect()
    }

    /// Classify a single point.
    ///
    /// Points without a usable baseline (missing, zero, or non-finite) and
    /// points with a non-finite revenue are never anomalous.
    pub fn classify(&self, point: &RollingPoint) -> AnomalyPoint {
        let rolling = match point.rolling {
            Some(r) if r != 0.0 && r.is_finite() && point.revenue.is_finite() => r,
            _ => return neutral(point),
        };

        let deviation = (point.revenue - rolling) / rolling;
        let magnitude = deviation.abs();
        let is_anomaly = magnitude > self.config.threshold;

        let severity = is_anomaly.then(|| {
            if magnitude > self.config.major_above {
                Severity::Major
            } else if magnitude > self.config.moderate_above {
                Severity::Moderate
            } else {
                Severity::Minor
            }
        });

        AnomalyPoint {
            month: point.month,
            revenue: point.revenue,
            rolling: point.rolling,
            is_anomaly,
            deviation_pct: deviation * 100.0,
            direction: Some(if deviation > 0.0 {
                Direction::Up
            } else {
                Direction::Down
            }),
            severity,
        }
    }
}

fn neutral(point: &RollingPoint) -> AnomalyPoint {
    AnomalyPoint {
        month: point.month,
        revenue: point.revenue,
        rolling: point.rolling,
        is_anomaly: false,
        deviation_pct: 0.0,
        direction: None,
        severity: None,
    }
}

/// Classify `points` against `threshold` with the default severity bands.
///
/// A threshold that is negative or non-finite is treated as zero, so every
/// point with a usable baseline and any deviation is flagged.
pub fn detect_anomalies(points: &[RollingPoint], threshold: f64) -> Vec<AnomalyPoint> {
    let threshold = if threshold.is_finite() {
        threshold.max(0.0)
    } else {
        0.0
    };
    let detector = AnomalyDetector {
        config: AnomalyDetectorConfig::with_threshold(threshold),
    };
    detector.detect(points)
}
