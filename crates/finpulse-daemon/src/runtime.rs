//! Daemon lifecycle: store, churn watch, their tickers and the reporting loop.

use std::future::Future;
use std::sync::Arc;

use finpulse_anomaly::{AnomalyDetector, AnomalyReport, Severity};
use finpulse_store::{
    kpis, operational_pulse, overall_status, ChurnSnapshot, ChurnWatch, DashboardSnapshot,
    MetricsStore, PulseStatus, SimulationTicker,
};
use tracing::{debug, info, warn};

use crate::config::DaemonConfig;
use crate::error::DaemonResult;

/// What the daemon reports for each published snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSummary {
    pub version: u64,
    pub latest_revenue: Option<f64>,
    pub pulse: PulseStatus,
    pub report: AnomalyReport,
}

/// A configured daemon, ready to run.
pub struct Daemon {
    config: DaemonConfig,
    store: Arc<MetricsStore>,
    churn: Arc<ChurnWatch>,
    detector: AnomalyDetector,
}

impl Daemon {
    pub fn new(config: DaemonConfig) -> DaemonResult<Self> {
        config.validate()?;
        let store = Arc::new(MetricsStore::new(config.simulation.clone())?);
        let churn = Arc::new(ChurnWatch::new(config.churn.clone())?);
        let detector = AnomalyDetector::new(config.anomaly.clone())?;
        Ok(Self {
            config,
            store,
            churn,
            detector,
        })
    }

    /// Shared handle to the store.
    pub fn store(&self) -> Arc<MetricsStore> {
        self.store.clone()
    }

    /// Shared handle to the churn watch.
    pub fn churn(&self) -> Arc<ChurnWatch> {
        self.churn.clone()
    }

    /// Classify the revenue series and the operational block of `snapshot`.
    pub fn summarize(&self, snapshot: &DashboardSnapshot) -> DaemonResult<SnapshotSummary> {
        let report = snapshot.anomaly_report(self.config.rolling_window, &self.detector)?;
        Ok(SnapshotSummary {
            version: snapshot.version,
            latest_revenue: snapshot.revenue_series.last().map(|p| p.revenue),
            pulse: overall_status(&operational_pulse(&snapshot.operational)),
            report,
        })
    }

    /// Tick the store and the churn watch until `shutdown` resolves,
    /// logging every snapshot.
    ///
    /// On return both tickers have stopped and both targets are closed.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> DaemonResult<()> {
        let period = self.config.simulation.tick_interval();
        let churn_period = self.config.churn.tick_interval();
        let mut rx = self.store.subscribe();
        let mut churn_rx = self.churn.subscribe();

        let initial = rx.borrow_and_update().clone();
        for kpi in kpis(&initial.metrics) {
            info!(
                kpi = kpi.id,
                value = %kpi.display,
                delta = %kpi.delta_display(),
                "{}",
                kpi.label
            );
        }
        self.report(&initial)?;
        let mut last_marker = churn_rx.borrow_and_update().markers_assigned;

        let ticker = SimulationTicker::spawn(self.store.clone(), period);
        let churn_ticker = SimulationTicker::spawn(self.churn.clone(), churn_period);
        info!(
            period_secs = period.as_secs(),
            churn_period_secs = churn_period.as_secs(),
            "finpulse daemon running"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        debug!("snapshot channel closed");
                        break;
                    }
                    let snapshot = rx.borrow_and_update().clone();
                    self.report(&snapshot)?;
                }
                changed = churn_rx.changed() => {
                    if changed.is_err() {
                        debug!("churn channel closed");
                        break;
                    }
                    let snapshot = churn_rx.borrow_and_update().clone();
                    report_churn(&snapshot, last_marker);
                    last_marker = snapshot.markers_assigned;
                }
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
            }
        }

        ticker.stop().await;
        churn_ticker.stop().await;
        self.store.close();
        self.churn.close();
        info!(
            version = self.store.version(),
            churn_version = self.churn.version(),
            "finpulse daemon stopped"
        );
        Ok(())
    }

    fn report(&self, snapshot: &DashboardSnapshot) -> DaemonResult<()> {
        let summary = self.summarize(snapshot)?;
        info!(
            version = summary.version,
            revenue = summary.latest_revenue.unwrap_or_default(),
            pulse = %summary.pulse,
            anomalies = summary.report.anomalies,
            "snapshot published"
        );
        if summary.pulse != PulseStatus::Ok {
            warn!(version = summary.version, pulse = %summary.pulse, "operational pulse degraded");
        }
        if let Some(point) = &summary.report.largest {
            if point.is_anomaly {
                let severity = point.severity.unwrap_or(Severity::Minor);
                warn!(
                    month = %point.month,
                    revenue = point.revenue,
                    deviation_pct = point.deviation_pct,
                    %severity,
                    "revenue anomaly"
                );
            }
        }
        Ok(())
    }
}

fn report_churn(snapshot: &ChurnSnapshot, markers_before: u32) {
    let Some(latest) = snapshot.latest() else {
        return;
    };
    debug!(
        version = snapshot.version,
        churn = latest.churn,
        avg = latest.avg,
        regime = snapshot.regime,
        "churn updated"
    );
    if snapshot.markers_assigned > markers_before {
        if let Some(marker) = latest.marker {
            warn!(
                %marker,
                idx = latest.idx,
                churn = latest.churn,
                avg = latest.avg,
                "churn turn"
            );
        }
    }
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("received terminate signal, shutting down");
        }
    }
}
