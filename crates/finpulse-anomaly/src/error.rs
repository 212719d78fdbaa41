use thiserror::Error;

/// Errors from anomaly detector configuration.
#[derive(Debug, Error)]
pub enum AnomalyError {
    #[error("invalid threshold {name}: {value} (must be finite and >= 0)")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("severity bands out of order: moderate_above {moderate} > major_above {major}")]
    SeverityBandsOutOfOrder { moderate: f64, major: f64 },

    #[error("rolling window must be at least 1")]
    EmptyWindow,
}

/// Convenience type alias for anomaly results.
pub type AnomalyResult<T> = Result<T, AnomalyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = AnomalyError::InvalidThreshold {
            name: "threshold",
            value: -0.5,
        };
        assert!(e.to_string().contains("-0.5"));

        let e = AnomalyError::SeverityBandsOutOfOrder {
            moderate: 0.4,
            major: 0.3,
        };
        assert!(e.to_string().contains("0.4"));
        assert!(e.to_string().contains("0.3"));
    }
}
