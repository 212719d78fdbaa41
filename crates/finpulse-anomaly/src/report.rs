//! Aggregate view over a classified series.

use serde::{Deserialize, Serialize};

use crate::types::{AnomalyPoint, Severity};

/// Summary counts for a classified revenue series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReport {
    pub total_points: usize,
    pub anomalies: usize,
    pub minor: usize,
    pub moderate: usize,
    pub major: usize,
    /// The anomalous point with the largest absolute deviation.
    pub largest: Option<AnomalyPoint>,
}

impl AnomalyReport {
    pub fn from_points(points: &[AnomalyPoint]) -> Self {
        let mut report = Self {
            total_points: points.len(),
            ..Self::default()
        };

        for p in points.iter().filter(|p| p.is_anomaly) {
            report.anomalies += 1;
            match p.severity {
                Some(Severity::Minor) => report.minor += 1,
                Some(Severity::Moderate) => report.moderate += 1,
                Some(Severity::Major) => report.major += 1,
                None => {}
            }
            let replace = report
                .largest
                .map_or(true, |l| p.deviation_pct.abs() > l.deviation_pct.abs());
            if replace {
                report.largest = Some(*p);
            }
        }

        report
    }

    pub fn has_anomalies(&self) -> bool {
        self.anomalies > 0
    }

    /// Highest severity present, if any.
    pub fn worst(&self) -> Option<Severity> {
        if self.major > 0 {
            Some(Severity::Major)
        } else if self.moderate > 0 {
            Some(Severity::Moderate)
        } else if self.minor > 0 {
            Some(Severity::Minor)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::detect_anomalies;
    use crate::rolling::RollingPoint;
    use crate::types::Direction;
    use finpulse_types::Month;

    #[test]
    fn empty_series() {
        let report = AnomalyReport::from_points(&[]);
        assert_eq!(report.total_points, 0);
        assert!(!report.has_anomalies());
        assert!(report.worst().is_none());
        assert!(report.largest.is_none());
    }

    #[test]
    fn counts_by_severity() {
        let points = [
            RollingPoint::new(Month::Jan, 100.0, None),
            RollingPoint::new(Month::Feb, 120.0, Some(100.0)),
            RollingPoint::new(Month::Mar, 70.0, Some(100.0)),
            RollingPoint::new(Month::Apr, 140.0, Some(100.0)),
            RollingPoint::new(Month::May, 105.0, Some(100.0)),
        ];
        let report = AnomalyReport::from_points(&detect_anomalies(&points, 0.18));

        assert_eq!(report.total_points, 5);
        assert_eq!(report.anomalies, 3);
        assert_eq!(report.minor, 1);
        assert_eq!(report.moderate, 1);
        assert_eq!(report.major, 1);
        assert_eq!(report.worst(), Some(Severity::Major));

        let largest = report.largest.unwrap();
        assert_eq!(largest.month, Month::Apr);
        assert_eq!(largest.direction, Some(Direction::Up));
    }

    #[test]
    fn largest_compares_magnitude() {
        let points = [
            RollingPoint::new(Month::Jan, 125.0, Some(100.0)),
            RollingPoint::new(Month::Feb, 60.0, Some(100.0)),
        ];
        let report = AnomalyReport::from_points(&detect_anomalies(&points, 0.18));
        assert_eq!(report.largest.unwrap().month, Month::Feb);
    }
}
