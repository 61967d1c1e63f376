use async_trait::async_trait;
use common::models::{OrderRequest, Signal};

use crate::{error::BackendError, remote::Ack};

/// The external trading backend. Everything behind it (signal generation,
/// execution, risk) is out of this workspace's hands.
#[async_trait]
pub trait TradingBackend: Send + Sync {
    /// `POST /place-order`
    async fn place_order(&self, order: &OrderRequest) -> Result<Ack, BackendError>;

    /// `POST /track-signal`
    async fn track_signal(&self, strategy_id: &str, active: bool) -> Result<Ack, BackendError>;

    /// `GET /get-signals?strategyId=..`
    async fn get_signals(&self, strategy_id: &str) -> Result<Vec<Signal>, BackendError>;
}
