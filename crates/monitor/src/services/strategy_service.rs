use std::sync::Arc;
use std::time::Duration;

use backend::TradingBackend;
use chrono::{DateTime, Utc};
use common::models::{ExecutionMode, Signal, Strategy, StrategyId};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::MonitorError;
use crate::services::signal_book::FetchStats;
use crate::services::signal_fetcher::{FetchOutcome, SignalFetcher, lock_book};
use crate::services::signal_poller::{PollerHandle, SignalPoller};

pub const TOGGLE_FAILED: &str = "Failed to toggle strategy. Please try again.";
pub const FETCH_FAILED: &str = "Failed to fetch signals. Please try again.";
pub const STOP_TRACKING_FAILED: &str = "Failed to stop tracking strategy on the backend.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyFilter {
    All,
    Active,
    Auto,
}

/// Owns the strategy list and drives the Inactive/Active and Manual/Auto
/// toggles. The active set is published in list order for the poller.
pub struct StrategyService<B: TradingBackend> {
    backend: Arc<B>,
    fetcher: SignalFetcher<B>,
    strategies: Vec<Strategy>,
    active_tx: watch::Sender<Vec<StrategyId>>,
    stop_tracking_on_deactivate: bool,
    banner: Option<String>,
}

impl<B: TradingBackend> StrategyService<B> {
    pub fn new(backend: Arc<B>, fetcher: SignalFetcher<B>, strategies: Vec<Strategy>) -> Self {
        let (active_tx, _) = watch::channel(Vec::new());
        let service = Self {
            backend,
            fetcher,
            strategies,
            active_tx,
            stop_tracking_on_deactivate: false,
            banner: None,
        };
        service.publish_active();
        service
    }

    pub fn with_stop_tracking(mut self, enabled: bool) -> Self {
        self.stop_tracking_on_deactivate = enabled;
        self
    }

    pub fn active_receiver(&self) -> watch::Receiver<Vec<StrategyId>> {
        self.active_tx.subscribe()
    }

    pub fn spawn_poller(&self, period: Duration) -> PollerHandle
    where
        B: 'static,
    {
        SignalPoller::new(self.fetcher.clone(), self.active_receiver(), period).spawn()
    }

    pub fn filter(&self, filter: StrategyFilter) -> Vec<&Strategy> {
        self.strategies
            .iter()
            .filter(|s| match filter {
                StrategyFilter::All => true,
                StrategyFilter::Active => s.is_active,
                StrategyFilter::Auto => s.is_auto,
            })
            .collect()
    }

    pub fn get(&self, id: &str) -> Result<&Strategy, MonitorError> {
        self.strategies
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| MonitorError::UnknownStrategy(id.to_string()))
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Strategy, MonitorError> {
        self.strategies
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| MonitorError::UnknownStrategy(id.to_string()))
    }

    /// Returns the new active state.
    pub async fn toggle_active(&mut self, id: &str) -> Result<bool, MonitorError> {
        if self.get(id)?.is_active {
            self.deactivate(id).await?;
            Ok(false)
        } else {
            self.activate(id).await?;
            Ok(true)
        }
    }

    /// Asks the backend to start tracking, then fetches the first batch. The
    /// strategy only becomes active once tracking was acknowledged.
    pub async fn activate(&mut self, id: &str) -> Result<(), MonitorError> {
        if self.get(id)?.is_active {
            return Ok(());
        }

        if let Err(e) = self.backend.track_signal(id, true).await {
            error!("Error toggling strategy {}: {}", id, e);
            self.banner = Some(TOGGLE_FAILED.to_string());
            return Err(e.into());
        }

        if let FetchOutcome::Failed(_) = self.fetcher.fetch(id).await {
            self.banner = Some(FETCH_FAILED.to_string());
        }

        self.get_mut(id)?.is_active = true;
        info!("Strategy {} is now monitored", id);
        self.publish_active();
        Ok(())
    }

    pub async fn deactivate(&mut self, id: &str) -> Result<(), MonitorError> {
        if !self.get(id)?.is_active {
            return Ok(());
        }

        self.get_mut(id)?.is_active = false;
        lock_book(self.fetcher.book()).invalidate(id);
        info!("Strategy {} paused", id);
        self.publish_active();

        if self.stop_tracking_on_deactivate {
            if let Err(e) = self.backend.track_signal(id, false).await {
                warn!("Backend did not acknowledge stop tracking for {}: {}", id, e);
                self.banner = Some(STOP_TRACKING_FAILED.to_string());
            }
        }
        Ok(())
    }

    pub fn toggle_auto(&mut self, id: &str) -> Result<ExecutionMode, MonitorError> {
        let strategy = self.get_mut(id)?;
        if !strategy.is_active {
            return Err(MonitorError::NotActive(id.to_string()));
        }
        strategy.is_auto = !strategy.is_auto;
        info!("Strategy {} execution mode: {:?}", id, strategy.execution_mode());
        Ok(strategy.execution_mode())
    }

    /// Manual refresh of one active strategy.
    pub async fn refresh(&mut self, id: &str) -> Result<FetchOutcome, MonitorError> {
        if !self.get(id)?.is_active {
            return Err(MonitorError::NotActive(id.to_string()));
        }
        let outcome = self.fetcher.fetch(id).await;
        if let FetchOutcome::Failed(_) = outcome {
            self.banner = Some(FETCH_FAILED.to_string());
        }
        Ok(outcome)
    }

    pub fn signals(&self, id: &str) -> Result<Vec<Signal>, MonitorError> {
        self.get(id)?;
        Ok(lock_book(self.fetcher.book()).signals(id).to_vec())
    }

    /// When the strategy's signals were last replaced by a fetch.
    pub fn last_updated(&self, id: &str) -> Result<Option<DateTime<Utc>>, MonitorError> {
        self.get(id)?;
        Ok(lock_book(self.fetcher.book()).refreshed_at(id))
    }

    pub fn stats(&self) -> FetchStats {
        lock_book(self.fetcher.book()).stats().clone()
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn clear_banner(&mut self) {
        self.banner = None;
    }

    fn publish_active(&self) {
        let active: Vec<StrategyId> = self
            .strategies
            .iter()
            .filter(|s| s.is_active)
            .map(|s| s.id.clone())
            .collect();
        self.active_tx.send_replace(active);
    }
}
