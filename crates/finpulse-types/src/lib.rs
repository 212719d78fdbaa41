//! # finpulse-types
//!
//! Shared data model for the Finpulse metrics core.
//!
//! Everything here is plain data: the store owns and mutates it, the anomaly
//! detector and the dashboard views only read it. All types serialize as
//! camelCase JSON so UI consumers can take snapshots verbatim.

#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};

// ── Month ───────────────────────────────────────────────────────────────

/// Calendar month label used on the revenue axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    /// All months in calendar order.
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    /// Zero-based position in the calendar.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Month at `index`, wrapping past December.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// The following month; December wraps to January.
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Three-letter label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jan => "Jan",
            Self::Feb => "Feb",
            Self::Mar => "Mar",
            Self::Apr => "Apr",
            Self::May => "May",
            Self::Jun => "Jun",
            Self::Jul => "Jul",
            Self::Aug => "Aug",
            Self::Sep => "Sep",
            Self::Oct => "Oct",
            Self::Nov => "Nov",
            Self::Dec => "Dec",
        }
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Revenue ─────────────────────────────────────────────────────────────

/// One month of revenue. Series order is chronological order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevenuePoint {
    pub month: Month,
    pub revenue: f64,
}

impl RevenuePoint {
    pub fn new(month: Month, revenue: f64) -> Self {
        Self { month, revenue }
    }
}

// ── Headline KPIs ───────────────────────────────────────────────────────

/// Headline KPI block. Deltas are signed percentages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSet {
    pub revenue: f64,
    pub revenue_delta: f64,
    pub customers: u64,
    pub customers_delta: f64,
    pub arr: f64,
    pub arr_delta: f64,
    /// Percent, always within `[0, 100]`.
    pub churn: f64,
    pub churn_delta: f64,
}

impl Default for MetricSet {
    fn default() -> Self {
        Self {
            revenue: 325_000.0,
            revenue_delta: 5.2,
            customers: 2_380,
            customers_delta: 3.1,
            arr: 780_000.0,
            arr_delta: 4.4,
            churn: 2.4,
            churn_delta: -0.2,
        }
    }
}

// ── Allocation ──────────────────────────────────────────────────────────

/// One slice of the revenue allocation breakdown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub label: String,
    pub value: f64,
}

impl AllocationSlice {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }

    /// The dashboard's seed breakdown (sums to 100).
    pub fn default_breakdown() -> Vec<AllocationSlice> {
        vec![
            Self::new("Subscriptions", 52.0),
            Self::new("Services", 18.0),
            Self::new("Marketplace", 12.0),
            Self::new("Ads", 10.0),
            Self::new("Other", 8.0),
        ]
    }
}

// ── Operational metrics ─────────────────────────────────────────────────

/// Operational health block.
///
/// Every field except `security_incidents` is a bounded random walk;
/// `security_incidents` only ever increases.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalMetrics {
    /// Percent.
    pub uptime: f64,
    /// Milliseconds.
    pub p95_latency: f64,
    pub security_incidents: u64,
    pub support_backlog: u32,
    pub replica_lag_ms: u32,
    /// 0-10 scale, one decimal place.
    pub health_score: f64,
}

impl Default for OperationalMetrics {
    fn default() -> Self {
        Self {
            uptime: 99.9,
            p95_latency: 340.0,
            security_incidents: 0,
            support_backlog: 42,
            replica_lag_ms: 55,
            health_score: 8.4,
        }
    }
}
