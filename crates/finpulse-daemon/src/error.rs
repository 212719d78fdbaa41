//! Daemon error types

use finpulse_anomaly::AnomalyError;
use finpulse_store::StoreError;
use thiserror::Error;

/// Errors surfaced by `finpulsed`.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to load configuration: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("anomaly detector error: {0}")]
    Anomaly(#[from] AnomalyError),

    #[error("logging setup failed: {0}")]
    Logging(String),
}

pub type DaemonResult<T> = Result<T, DaemonError>;
