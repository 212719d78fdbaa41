//! Finpulse daemon library
//!
//! Building blocks for `finpulsed`:
//! - Layered configuration (defaults, file, `FINPULSE__*` environment)
//! - Daemon lifecycle: metrics store, churn watch, their tickers, snapshot reporting

pub mod config;
pub mod error;
pub mod runtime;

pub use config::{DaemonConfig, LoggingConfig};
pub use error::{DaemonError, DaemonResult};
pub use runtime::{shutdown_signal, Daemon, SnapshotSummary};
