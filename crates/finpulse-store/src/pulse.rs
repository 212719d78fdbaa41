//! Operational pulse: per-field status against nominal reference values.

use std::fmt;

use finpulse_types::OperationalMetrics;
use serde::{Deserialize, Serialize};

pub const REFERENCE_UPTIME: f64 = 99.9;
pub const REFERENCE_P95_LATENCY: f64 = 340.0;
pub const REFERENCE_SUPPORT_BACKLOG: f64 = 50.0;
pub const REFERENCE_REPLICA_LAG_MS: f64 = 55.0;
pub const REFERENCE_HEALTH_SCORE: f64 = 8.4;

// Warn thresholds
const WARN_UPTIME_BELOW: f64 = 99.7;
const WARN_P95_ABOVE: f64 = 420.0;
const WARN_BACKLOG_ABOVE: u32 = 80;
const WARN_LAG_ABOVE: u32 = 90;
const WARN_HEALTH_BELOW: f64 = 7.2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PulseStatus {
    Ok,
    Warn,
    Crit,
}

impl fmt::Display for PulseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Warn => write!(f, "warn"),
            Self::Crit => write!(f, "crit"),
        }
    }
}

/// One row of the pulse panel.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PulseReading {
    pub key: &'static str,
    pub label: &'static str,
    pub status: PulseStatus,
    /// Formatted current value, e.g. `99.90%`.
    pub primary: String,
    /// Signed difference from the reference value; the incident count for
    /// `secInc`.
    pub change: f64,
    pub unit: &'static str,
    /// Panel text for `change`, e.g. `+12ms` or `0 this month`.
    pub change_text: String,
}

impl PulseReading {
    pub fn change_display(&self) -> &str {
        &self.change_text
    }
}

/// Pulse readings for every operational field, in panel order.
pub fn operational_pulse(ops: &OperationalMetrics) -> Vec<PulseReading> {
    let backlog_change = f64::from(ops.support_backlog) - REFERENCE_SUPPORT_BACKLOG;
    let lag_change = f64::from(ops.replica_lag_ms) - REFERENCE_REPLICA_LAG_MS;
    vec![
        PulseReading {
            key: "uptime",
            label: "Core API Uptime (30d)",
            status: warn_if(ops.uptime < WARN_UPTIME_BELOW),
            primary: format!("{:.2}%", ops.uptime),
            change: ops.uptime - REFERENCE_UPTIME,
            unit: "%",
            change_text: delta_text(ops.uptime - REFERENCE_UPTIME, "%", 2),
        },
        PulseReading {
            key: "latency",
            label: "p95 Latency",
            status: warn_if(ops.p95_latency > WARN_P95_ABOVE),
            primary: format!("{}ms", ops.p95_latency.round()),
            change: ops.p95_latency - REFERENCE_P95_LATENCY,
            unit: "ms",
            change_text: delta_text(ops.p95_latency - REFERENCE_P95_LATENCY, "ms", 0),
        },
        PulseReading {
            key: "secInc",
            label: "Security Incidents",
            status: if ops.security_incidents > 0 {
                PulseStatus::Crit
            } else {
                PulseStatus::Ok
            },
            primary: ops.security_incidents.to_string(),
            change: ops.security_incidents as f64,
            unit: "",
            change_text: if ops.security_incidents > 0 {
                "+1 recent".to_string()
            } else {
                "0 this month".to_string()
            },
        },
        PulseReading {
            key: "supportBacklog",
            label: "Support Backlog",
            status: warn_if(ops.support_backlog > WARN_BACKLOG_ABOVE),
            primary: ops.support_backlog.to_string(),
            change: backlog_change,
            unit: "",
            change_text: delta_text(backlog_change, "", 0),
        },
        PulseReading {
            key: "repLag",
            label: "Replica Lag",
            status: warn_if(ops.replica_lag_ms > WARN_LAG_ABOVE),
            primary: format!("{}ms", ops.replica_lag_ms),
            change: lag_change,
            unit: "ms",
            change_text: delta_text(lag_change, "ms", 0),
        },
        PulseReading {
            key: "healthScore",
            label: "Tenant Health Score",
            status: warn_if(ops.health_score < WARN_HEALTH_BELOW),
            primary: format!("{:.1}", ops.health_score),
            change: ops.health_score - REFERENCE_HEALTH_SCORE,
            unit: "",
            change_text: delta_text(ops.health_score - REFERENCE_HEALTH_SCORE, "", 1),
        },
    ]
}

/// Highest status across all readings.
pub fn overall_status(readings: &[PulseReading]) -> PulseStatus {
    readings
        .iter()
        .map(|r| r.status)
        .max()
        .unwrap_or(PulseStatus::Ok)
}

/// `+12ms`, `-0.05%`, `0`.
fn delta_text(change: f64, unit: &str, decimals: usize) -> String {
    let sign = if change > 0.0 { "+" } else { "" };
    format!("{sign}{change:.decimals$}{unit}")
}

fn warn_if(cond: bool) -> PulseStatus {
    if cond {
        PulseStatus::Warn
    } else {
        PulseStatus::Ok
    }
}
