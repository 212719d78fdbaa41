use finpulse_types::Month;
use thiserror::Error;

/// Errors from the metrics store.
///
/// `advance_tick` never fails; these only surface from configuration
/// validation and externally supplied KPI updates.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid simulation config: {field} -- {detail}")]
    InvalidConfig { field: String, detail: String },

    #[error("invalid metric set: {field} = {value} ({detail})")]
    InvalidMetrics {
        field: &'static str,
        value: f64,
        detail: &'static str,
    },

    #[error("invalid revenue point: {month} = {value} (must be finite and >= 0)")]
    InvalidRevenue { month: Month, value: f64 },

    #[error("anomaly pipeline error: {0}")]
    Anomaly(#[from] finpulse_anomaly::AnomalyError),
}

impl StoreError {
    pub(crate) fn config(field: impl Into<String>, detail: impl Into<String>) -> Self {
        StoreError::InvalidConfig {
            field: field.into(),
            detail: detail.into(),
        }
    }
}

/// Convenience type alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = StoreError::config("operational.uptime", "min 100 > max 99.5");
        assert!(e.to_string().contains("operational.uptime"));
        assert!(e.to_string().contains("min 100 > max 99.5"));

        let e = StoreError::InvalidMetrics {
            field: "churn",
            value: 140.0,
            detail: "must be within [0, 100]",
        };
        assert!(e.to_string().contains("churn"));
        assert!(e.to_string().contains("140"));
    }

    #[test]
    fn anomaly_error_conversion() {
        let e: StoreError = finpulse_anomaly::AnomalyError::EmptyWindow.into();
        assert!(e.to_string().contains("window"));
    }
}
