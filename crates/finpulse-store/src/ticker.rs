//! Periodic driver for the simulations: [`MetricsStore`] and [`ChurnWatch`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::churn::ChurnWatch;
use crate::store::MetricsStore;

/// Something a [`SimulationTicker`] can drive.
pub trait Tickable: Send + Sync + 'static {
    /// Advance by one step and publish.
    fn tick(&self);

    /// A closed target ends its ticker.
    fn is_closed(&self) -> bool;
}

impl Tickable for MetricsStore {
    fn tick(&self) {
        self.advance_tick();
    }

    fn is_closed(&self) -> bool {
        MetricsStore::is_closed(self)
    }
}

impl Tickable for ChurnWatch {
    fn tick(&self) {
        self.advance_tick();
    }

    fn is_closed(&self) -> bool {
        ChurnWatch::is_closed(self)
    }
}

/// Spawns the background tick loop.
pub struct SimulationTicker;

impl SimulationTicker {
    /// Tick `target` every `period`, starting one period from now.
    ///
    /// The loop ends when the handle is stopped or dropped, or once the
    /// target is closed. Must be called inside a tokio runtime.
    pub fn spawn<T: Tickable>(target: Arc<T>, period: Duration) -> TickerHandle {
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            debug!(
                period_ms = period.as_millis() as u64,
                "simulation ticker started"
            );

            loop {
                tokio::select! {
                    _ = ticks.tick() => {
                        if target.is_closed() {
                            debug!("target closed; simulation ticker exiting");
                            break;
                        }
                        target.tick();
                    }
                    _ = stop_rx.recv() => {
                        debug!("simulation ticker stopped");
                        break;
                    }
                }
            }
        });

        TickerHandle {
            task: Some(task),
            stop: stop_tx,
        }
    }
}

/// Handle for a running ticker. Dropping it aborts the loop.
pub struct TickerHandle {
    task: Option<JoinHandle<()>>,
    stop: mpsc::Sender<()>,
}

impl TickerHandle {
    /// Stop the ticker and wait for the loop to exit.
    ///
    /// No tick starts after this returns.
    pub async fn stop(mut self) {
        let _ = self.stop.send(()).await;
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "simulation ticker task failed");
                }
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::churn::ChurnWatchConfig;
    use crate::config::SimulationConfig;

    fn store() -> Arc<MetricsStore> {
        let store = MetricsStore::with_seed(SimulationConfig::default(), 5).unwrap();
        Arc::new(store)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let store = store();
        let handle = SimulationTicker::spawn(store.clone(), Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(store.version(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.version(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(store.version(), 3);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_are_woken() {
        let store = store();
        let mut rx = store.subscribe();
        let handle = SimulationTicker::spawn(store.clone(), Duration::from_secs(30));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().version, 1);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().version, 2);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn no_ticks_after_stop() {
        let store = store();
        let handle = SimulationTicker::spawn(store.clone(), Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(31)).await;
        handle.stop().await;

        let version = store.version();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(store.version(), version);
    }

    #[tokio::test(start_paused = true)]
    async fn exits_when_store_closed() {
        let store = store();
        let handle = SimulationTicker::spawn(store.clone(), Duration::from_secs(30));
        store.close();

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(handle.is_finished());
        assert_eq!(store.version(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_loop() {
        let store = store();
        let handle = SimulationTicker::spawn(store.clone(), Duration::from_secs(30));
        drop(handle);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(store.version(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drives_churn_watch() {
        let watch = ChurnWatch::with_seed(ChurnWatchConfig::default(), 5).unwrap();
        let watch = Arc::new(watch);
        let period = watch.config().tick_interval();
        let handle = SimulationTicker::spawn(watch.clone(), period);

        tokio::time::sleep(Duration::from_secs(26)).await;
        assert_eq!(watch.version(), 5);
        assert_eq!(watch.snapshot().points.len(), 25);

        // Paused: the loop keeps running but nothing is published.
        watch.set_live(false);
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(watch.version(), 5);
        assert!(!handle.is_finished());

        watch.set_live(true);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(watch.version(), 6);

        watch.close();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(handle.is_finished());
    }
}
