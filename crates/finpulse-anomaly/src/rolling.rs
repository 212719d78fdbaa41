//! Rolling-average enrichment.
//!
//! Produces the baseline the detector compares against: a trailing mean of
//! the current point and the `window - 1` points before it, rounded to whole
//! currency units. Points without a full window get no baseline.

use finpulse_types::{Month, RevenuePoint};
use serde::{Deserialize, Serialize};

use crate::error::{AnomalyError, AnomalyResult};

/// Default trailing window (current point plus two predecessors).
pub const DEFAULT_ROLLING_WINDOW: usize = 3;

/// A revenue point carrying its rolling baseline, if one exists yet.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RollingPoint {
    pub month: Month,
    pub revenue: f64,
    pub rolling: Option<f64>,
}

impl RollingPoint {
    pub fn new(month: Month, revenue: f64, rolling: Option<f64>) -> Self {
        Self {
            month,
            revenue,
            rolling,
        }
    }
}

impl From<RevenuePoint> for RollingPoint {
    fn from(p: RevenuePoint) -> Self {
        Self::new(p.month, p.revenue, None)
    }
}

/// Enrich a series with a trailing `window`-point mean.
pub fn rolling_average(series: &[RevenuePoint], window: usize) -> AnomalyResult<Vec<RollingPoint>> {
    if window == 0 {
        return Err(AnomalyError::EmptyWindow);
    }

    Ok(series
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let rolling = if i + 1 < window {
                None
            } else {
                let sum: f64 = series[i + 1 - window..=i].iter().map(|q| q.revenue).sum();
                Some((sum / window as f64).round())
            };
            RollingPoint::new(p.month, p.revenue, rolling)
        })
        .collect())
}
