//! Configuration for finpulsed

use finpulse_anomaly::{AnomalyDetectorConfig, DEFAULT_ROLLING_WINDOW};
use finpulse_store::{ChurnWatchConfig, SimulationConfig};
use serde::{Deserialize, Serialize};

use crate::error::{DaemonError, DaemonResult};

/// Environment variable prefix; nested keys use `__`,
/// e.g. `FINPULSE__SIMULATION__TICK_INTERVAL_SECS=5`.
pub const ENV_PREFIX: &str = "FINPULSE";

/// Main daemon configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Metrics simulation
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Churn-rate trace
    #[serde(default)]
    pub churn: ChurnWatchConfig,

    /// Anomaly thresholds
    #[serde(default)]
    pub anomaly: AnomalyDetectorConfig,

    /// Rolling-average window for the revenue baseline
    #[serde(default = "default_rolling_window")]
    pub rolling_window: usize,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            churn: ChurnWatchConfig::default(),
            anomaly: AnomalyDetectorConfig::default(),
            rolling_window: DEFAULT_ROLLING_WINDOW,
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_rolling_window() -> usize {
    DEFAULT_ROLLING_WINDOW
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: built-in defaults, then the optional file, then
    /// `FINPULSE__*` environment variables.
    pub fn load(path: Option<&str>) -> DaemonResult<Self> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: DaemonConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DaemonResult<()> {
        self.simulation.validate()?;
        self.churn.validate()?;
        self.anomaly.validate()?;
        if self.rolling_window == 0 {
            return Err(DaemonError::Config("rolling_window must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.rolling_window, 3);
        assert_eq!(config.simulation.tick_interval_secs, 30);
        assert_eq!(config.churn.tick_interval_secs, 5);
        assert!(config.churn.live);
        assert!((config.anomaly.threshold - 0.18).abs() < f64::EPSILON);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_without_file_yields_defaults() {
        let config = DaemonConfig::load(None).unwrap();
        assert_eq!(config.simulation.revenue.window, 12);
        assert_eq!(config.simulation.seed, None);
        assert_eq!(config.rolling_window, 3);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let config = DaemonConfig::load(Some("/nonexistent/finpulse-config")).unwrap();
        assert_eq!(config.rolling_window, 3);
    }

    #[test]
    fn file_overrides_defaults() {
        let path =
            std::env::temp_dir().join(format!("finpulse-test-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "rolling_window = 4\n\n[simulation]\ntick_interval_secs = 5\nseed = 42\n\n[churn]\nlive = false\nmax_markers = 2\n\n[anomaly]\nthreshold = 0.2\n\n[logging]\njson = true"
        )
        .unwrap();
        drop(file);

        let config = DaemonConfig::load(path.to_str()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.rolling_window, 4);
        assert_eq!(config.simulation.tick_interval_secs, 5);
        assert_eq!(config.simulation.seed, Some(42));
        assert!((config.anomaly.threshold - 0.2).abs() < f64::EPSILON);
        assert!((config.anomaly.major_above - 0.35).abs() < f64::EPSILON);
        assert!(config.logging.json);
        assert_eq!(config.simulation.revenue.window, 12);
        assert!(!config.churn.live);
        assert_eq!(config.churn.max_markers, 2);
        assert_eq!(config.churn.capacity, 60);
    }

    #[test]
    fn invalid_values_rejected() {
        let mut config = DaemonConfig::default();
        config.rolling_window = 0;
        assert!(matches!(config.validate(), Err(DaemonError::Config(_))));

        let mut config = DaemonConfig::default();
        config.anomaly.threshold = -1.0;
        assert!(matches!(config.validate(), Err(DaemonError::Anomaly(_))));

        let mut config = DaemonConfig::default();
        config.simulation.incident_probability = 2.0;
        assert!(matches!(config.validate(), Err(DaemonError::Store(_))));

        let mut config = DaemonConfig::default();
        config.churn.capacity = 0;
        assert!(matches!(config.validate(), Err(DaemonError::Store(_))));
    }
}
