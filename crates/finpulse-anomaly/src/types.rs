//! Anomaly classification types.

use finpulse_types::Month;
use serde::{Deserialize, Serialize};

use crate::error::{AnomalyError, AnomalyResult};

/// Default detection threshold (18% deviation from the rolling baseline).
pub const DEFAULT_THRESHOLD: f64 = 0.18;

/// Deviations strictly above this are at least `Moderate`.
pub const DEFAULT_MODERATE_ABOVE: f64 = 0.25;

/// Deviations strictly above this are `Major`.
pub const DEFAULT_MAJOR_ABOVE: f64 = 0.35;

// ── Direction ───────────────────────────────────────────────────────────

/// Which side of the baseline a point falls on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

// ── Severity ────────────────────────────────────────────────────────────

/// Severity of an anomalous deviation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Major,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Minor => write!(f, "minor"),
            Self::Moderate => write!(f, "moderate"),
            Self::Major => write!(f, "major"),
        }
    }
}

// ── Classified point ────────────────────────────────────────────────────

/// A revenue point with its anomaly classification.
///
/// Derived on demand from the current series; never stored.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyPoint {
    pub month: Month,
    pub revenue: f64,
    pub rolling: Option<f64>,
    pub is_anomaly: bool,
    /// Signed deviation from `rolling`, in percent.
    pub deviation_pct: f64,
    pub direction: Option<Direction>,
    pub severity: Option<Severity>,
}

// ── Configuration ───────────────────────────────────────────────────────

/// Detector thresholds, all expressed as absolute fractional deviation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnomalyDetectorConfig {
    /// A point is anomalous when `|deviation| > threshold`.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_moderate_above")]
    pub moderate_above: f64,
    #[serde(default = "default_major_above")]
    pub major_above: f64,
}

impl Default for AnomalyDetectorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            moderate_above: DEFAULT_MODERATE_ABOVE,
            major_above: DEFAULT_MAJOR_ABOVE,
        }
    }
}

impl AnomalyDetectorConfig {
    /// Default severity bands with a custom detection threshold.
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> AnomalyResult<()> {
        for (name, value) in [
            ("threshold", self.threshold),
            ("moderate_above", self.moderate_above),
            ("major_above", self.major_above),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AnomalyError::InvalidThreshold { name, value });
            }
        }
        if self.moderate_above > self.major_above {
            return Err(AnomalyError::SeverityBandsOutOfOrder {
                moderate: self.moderate_above,
                major: self.major_above,
            });
        }
        Ok(())
    }
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_moderate_above() -> f64 {
    DEFAULT_MODERATE_ABOVE
}

fn default_major_above() -> f64 {
    DEFAULT_MAJOR_ABOVE
}
