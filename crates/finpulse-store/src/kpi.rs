//! Headline KPI cards derived from a [`MetricSet`].

use finpulse_types::MetricSet;
use serde::Serialize;

/// One KPI card: raw value, display string and period-over-period delta (%).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Kpi {
    pub id: &'static str,
    pub label: &'static str,
    pub value: f64,
    pub display: String,
    pub delta: f64,
}

impl Kpi {
    /// `▲ 5.2%` / `▼ 0.2%`.
    pub fn delta_display(&self) -> String {
        let arrow = if self.delta >= 0.0 { '▲' } else { '▼' };
        format!("{arrow} {:.1}%", self.delta.abs())
    }
}

/// Total revenue, active customers, ARR and churn, in display order.
pub fn kpis(metrics: &MetricSet) -> Vec<Kpi> {
    vec![
        Kpi {
            id: "rev",
            label: "Total Revenue",
            value: metrics.revenue,
            display: format!("${}", group_thousands(metrics.revenue)),
            delta: metrics.revenue_delta,
        },
        Kpi {
            id: "subs",
            label: "Active Customers",
            value: metrics.customers as f64,
            display: group_digits(metrics.customers),
            delta: metrics.customers_delta,
        },
        Kpi {
            id: "arr",
            label: "ARR",
            value: metrics.arr,
            display: format!("${:.1}k", metrics.arr / 1_000.0),
            delta: metrics.arr_delta,
        },
        Kpi {
            id: "churn",
            label: "Churn Rate",
            value: metrics.churn,
            display: format!("{:.2}%", metrics.churn),
            delta: metrics.churn_delta,
        },
    ]
}

/// Whole currency units with `,` separators; negative values keep their sign.
fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = group_digits(rounded.abs() as u64);
    if rounded < 0.0 {
        format!("-{digits}")
    } else {
        digits
    }
}

fn group_digits(n: u64) -> String {
    let raw = n.to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, c) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_render_like_the_dashboard() {
        let cards = kpis(&MetricSet::default());
        let displays: Vec<&str> = cards.iter().map(|k| k.display.as_str()).collect();
        assert_eq!(displays, vec!["$325,000", "2,380", "$780.0k", "2.40%"]);
        assert_eq!(cards[0].label, "Total Revenue");
        assert!((cards[3].delta + 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn delta_arrows() {
        let cards = kpis(&MetricSet::default());
        assert_eq!(cards[0].delta_display(), "▲ 5.2%");
        assert_eq!(cards[3].delta_display(), "▼ 0.2%");
    }

    #[test]
    fn digit_grouping() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1_000), "1,000");
        assert_eq!(group_digits(12_345_678), "12,345,678");
        assert_eq!(group_thousands(1_234.6), "1,235");
        assert_eq!(group_thousands(-2_500.0), "-2,500");
    }
}
