use common::models::StrategyId;

/// What the monitoring side reports to the view.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    SignalsUpdated { strategy_id: StrategyId, count: usize },
    FetchFailed { strategy_id: StrategyId, error: String },
    StaleDiscarded { strategy_id: StrategyId },
    SweepCompleted { strategies: usize },
}
