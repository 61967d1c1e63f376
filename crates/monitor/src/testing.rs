use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use backend::{Ack, BackendError, TradingBackend};
use chrono::{TimeZone, Utc};
use common::models::{OrderRequest, Signal, SignalSide};
use mockall::mock;
use tokio::time::Instant;

pub fn signal(strategy_id: &str, id: &str) -> Signal {
    Signal {
        id: id.to_string(),
        strategy_id: strategy_id.to_string(),
        side: SignalSide::Buy,
        instrument: "RELIANCE".to_string(),
        price: 2950.25,
        timestamp: Utc.with_ymd_and_hms(2026, 3, 2, 4, 0, 0).unwrap(),
    }
}

pub fn http_error(endpoint: &'static str) -> BackendError {
    BackendError::Status {
        endpoint,
        status: 503,
        body: "unavailable".to_string(),
    }
}

mock! {
    pub Backend {}

    #[async_trait]
    impl TradingBackend for Backend {
        async fn place_order(&self, order: &OrderRequest) -> Result<Ack, BackendError>;
        async fn track_signal(&self, strategy_id: &str, active: bool) -> Result<Ack, BackendError>;
        async fn get_signals(&self, strategy_id: &str) -> Result<Vec<Signal>, BackendError>;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    PlaceOrder(OrderRequest),
    Track(String, bool),
    GetSignals(String),
}

/// Records every call with the (virtual) instant it was made. Fetches can be
/// delayed or failed per strategy.
#[derive(Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<(Instant, Call)>>,
    delays: Mutex<HashMap<String, Duration>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingBackend {
    pub fn delay_fetch(&self, strategy_id: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(strategy_id.to_string(), delay);
    }

    pub fn fail_fetch(&self, strategy_id: &str) {
        self.failing.lock().unwrap().insert(strategy_id.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn fetches(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::GetSignals(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn fetch_times(&self) -> Vec<(Instant, String)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(at, c)| match c {
                Call::GetSignals(id) => Some((*at, id.clone())),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((Instant::now(), call));
    }
}

#[async_trait]
impl TradingBackend for RecordingBackend {
    async fn place_order(&self, order: &OrderRequest) -> Result<Ack, BackendError> {
        self.record(Call::PlaceOrder(order.clone()));
        Ok(Ack::empty())
    }

    async fn track_signal(&self, strategy_id: &str, active: bool) -> Result<Ack, BackendError> {
        self.record(Call::Track(strategy_id.to_string(), active));
        Ok(Ack::empty())
    }

    async fn get_signals(&self, strategy_id: &str) -> Result<Vec<Signal>, BackendError> {
        self.record(Call::GetSignals(strategy_id.to_string()));
        let delay = self.delays.lock().unwrap().get(strategy_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(strategy_id) {
            return Err(http_error("get-signals"));
        }
        Ok(vec![signal(strategy_id, &format!("{strategy_id}-sig"))])
    }
}
