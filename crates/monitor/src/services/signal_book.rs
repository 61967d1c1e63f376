use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::models::{Signal, StrategyId};

/// Proof that a fetch was issued; carries the sequence number the response
/// must be judged by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub strategy_id: StrategyId,
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Stale,
}

#[derive(Debug, Default)]
struct Entry {
    signals: Vec<Signal>,
    applied_seq: u64,
    /// Tickets below this were issued before the last invalidation.
    floor_seq: u64,
    attempted: bool,
    refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchStats {
    pub fetch_errors: u64,
    pub last_error: Option<String>,
    pub last_refresh: Option<DateTime<Utc>>,
}

/// Strategy id -> latest signal batch, guarded by per-request sequence numbers
/// so a slow response never overwrites a newer one.
#[derive(Debug, Default)]
pub struct SignalBook {
    entries: HashMap<StrategyId, Entry>,
    next_seq: u64,
    stats: FetchStats,
}

impl SignalBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, strategy_id: &str) -> FetchTicket {
        self.next_seq += 1;
        let entry = self.entries.entry(strategy_id.to_string()).or_default();
        entry.attempted = true;
        FetchTicket {
            strategy_id: strategy_id.to_string(),
            seq: self.next_seq,
        }
    }

    pub fn apply(&mut self, ticket: &FetchTicket, signals: Vec<Signal>) -> ApplyOutcome {
        let entry = self.entries.entry(ticket.strategy_id.clone()).or_default();
        if ticket.seq <= entry.applied_seq || ticket.seq < entry.floor_seq {
            return ApplyOutcome::Stale;
        }

        let now = Utc::now();
        entry.signals = signals;
        entry.applied_seq = ticket.seq;
        entry.refreshed_at = Some(now);
        self.stats.last_refresh = Some(now);
        ApplyOutcome::Applied
    }

    pub fn record_failure(&mut self, ticket: &FetchTicket, error: &str) {
        self.stats.fetch_errors += 1;
        self.stats.last_error = Some(format!("{}: {}", ticket.strategy_id, error));
    }

    /// Every ticket issued so far for `strategy_id` becomes stale. The cached
    /// signals stay visible.
    pub fn invalidate(&mut self, strategy_id: &str) {
        let floor = self.next_seq + 1;
        let entry = self.entries.entry(strategy_id.to_string()).or_default();
        entry.floor_seq = floor;
        entry.attempted = false;
    }

    /// True until a fetch has been issued since the last invalidation.
    pub fn needs_initial_fetch(&self, strategy_id: &str) -> bool {
        self.entries
            .get(strategy_id)
            .is_none_or(|entry| !entry.attempted)
    }

    pub fn signals(&self, strategy_id: &str) -> &[Signal] {
        self.entries
            .get(strategy_id)
            .map(|entry| entry.signals.as_slice())
            .unwrap_or_default()
    }

    pub fn refreshed_at(&self, strategy_id: &str) -> Option<DateTime<Utc>> {
        self.entries.get(strategy_id).and_then(|e| e.refreshed_at)
    }

    pub fn stats(&self) -> &FetchStats {
        &self.stats
    }
}
