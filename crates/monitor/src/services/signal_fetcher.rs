use std::sync::{Arc, Mutex, MutexGuard};

use backend::TradingBackend;
use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use crate::events::MonitorEvent;
use crate::services::signal_book::{ApplyOutcome, SignalBook};

pub type SharedSignalBook = Arc<Mutex<SignalBook>>;

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Applied(usize),
    Stale,
    Failed(String),
}

pub fn lock_book(book: &SharedSignalBook) -> MutexGuard<'_, SignalBook> {
    // The book holds plain data; a panic mid-update leaves nothing to repair.
    book.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Fetches one strategy's signals into the shared book. Failures are logged
/// and counted, never propagated to the caller's loop.
pub struct SignalFetcher<B: TradingBackend> {
    backend: Arc<B>,
    book: SharedSignalBook,
    events_tx: broadcast::Sender<MonitorEvent>,
}

impl<B: TradingBackend> Clone for SignalFetcher<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            book: self.book.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

impl<B: TradingBackend> SignalFetcher<B> {
    pub fn new(
        backend: Arc<B>,
        book: SharedSignalBook,
        events_tx: broadcast::Sender<MonitorEvent>,
    ) -> Self {
        Self {
            backend,
            book,
            events_tx,
        }
    }

    pub fn book(&self) -> &SharedSignalBook {
        &self.book
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events_tx.subscribe()
    }

    pub async fn fetch(&self, strategy_id: &str) -> FetchOutcome {
        let ticket = lock_book(&self.book).begin(strategy_id);

        match self.backend.get_signals(strategy_id).await {
            Ok(signals) => {
                let count = signals.len();
                let outcome = lock_book(&self.book).apply(&ticket, signals);
                match outcome {
                    ApplyOutcome::Applied => {
                        debug!("Strategy {}: {} signals", strategy_id, count);
                        self.publish(MonitorEvent::SignalsUpdated {
                            strategy_id: strategy_id.to_string(),
                            count,
                        });
                        FetchOutcome::Applied(count)
                    }
                    ApplyOutcome::Stale => {
                        warn!(
                            "Discarding stale signal response for strategy {} (seq {})",
                            strategy_id, ticket.seq
                        );
                        self.publish(MonitorEvent::StaleDiscarded {
                            strategy_id: strategy_id.to_string(),
                        });
                        FetchOutcome::Stale
                    }
                }
            }
            Err(e) => {
                let message = e.to_string();
                error!("Error fetching signals for strategy {}: {}", strategy_id, message);
                lock_book(&self.book).record_failure(&ticket, &message);
                self.publish(MonitorEvent::FetchFailed {
                    strategy_id: strategy_id.to_string(),
                    error: message.clone(),
                });
                FetchOutcome::Failed(message)
            }
        }
    }

    pub(crate) fn publish(&self, event: MonitorEvent) {
        let _ = self.events_tx.send(event);
    }
}
