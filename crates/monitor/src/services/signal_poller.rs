use std::time::Duration;

use backend::TradingBackend;
use common::models::StrategyId;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::events::MonitorEvent;
use crate::services::signal_fetcher::{SignalFetcher, lock_book};

/// Keeps the signal book fresh for every active strategy.
///
/// The active set arrives over a watch channel in catalog order. Whenever the
/// set becomes non-empty or gains members, strategies that were never fetched
/// in their current activation are fetched right away. The timer is armed when
/// the set becomes non-empty and keeps its schedule while members come and go.
/// Every tick sweeps all active strategies one at a time. Sweeps run
/// inside this single task, so a slow sweep delays the next tick rather than
/// overlapping with it.
pub struct SignalPoller<B: TradingBackend> {
    fetcher: SignalFetcher<B>,
    active_rx: watch::Receiver<Vec<StrategyId>>,
    period: Duration,
}

/// The poller task. Dropping the handle aborts it.
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn shutdown(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<B: TradingBackend + 'static> SignalPoller<B> {
    pub fn new(
        fetcher: SignalFetcher<B>,
        active_rx: watch::Receiver<Vec<StrategyId>>,
        period: Duration,
    ) -> Self {
        Self {
            fetcher,
            active_rx,
            period,
        }
    }

    pub fn spawn(self) -> PollerHandle {
        PollerHandle {
            task: tokio::spawn(self.run()),
        }
    }

    async fn run(mut self) {
        info!("Starting signal poller, period {:?}", self.period);

        loop {
            let mut current = self.active_rx.borrow_and_update().clone();
            if current.is_empty() {
                debug!("No active strategies, polling paused");
                if self.active_rx.changed().await.is_err() {
                    break;
                }
                continue;
            }

            self.initial_sweep(&current).await;

            let mut ticker = time::interval_at(Instant::now() + self.period, self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let keep_running = loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.sweep().await;
                    }
                    changed = self.active_rx.changed() => {
                        if changed.is_err() {
                            break false;
                        }
                        let next = self.active_rx.borrow_and_update().clone();
                        if next.is_empty() {
                            break true;
                        }
                        // Newcomers get their first fetch now; the schedule
                        // of everyone else is left alone.
                        if next.iter().any(|id| !current.contains(id)) {
                            self.initial_sweep(&next).await;
                        }
                        current = next;
                    }
                }
            };

            if !keep_running {
                break;
            }
        }

        info!("Signal poller stopped.");
    }

    fn is_active(&self, strategy_id: &str) -> bool {
        self.active_rx.borrow().iter().any(|id| id == strategy_id)
    }

    async fn initial_sweep(&self, active: &[StrategyId]) {
        let mut fetched = 0;
        for id in active {
            let pending = self.is_active(id) && lock_book(self.fetcher.book()).needs_initial_fetch(id);
            if pending {
                self.fetcher.fetch(id).await;
                fetched += 1;
            }
        }
        if fetched > 0 {
            self.fetcher
                .publish(MonitorEvent::SweepCompleted { strategies: fetched });
        }
    }

    async fn sweep(&self) {
        let planned = self.active_rx.borrow().clone();
        debug!("Sweeping {} active strategies", planned.len());

        let mut fetched = 0;
        for id in &planned {
            // Deactivated since the sweep started.
            if !self.is_active(id) {
                continue;
            }
            self.fetcher.fetch(id).await;
            fetched += 1;
        }

        self.fetcher
            .publish(MonitorEvent::SweepCompleted { strategies: fetched });
    }
}
