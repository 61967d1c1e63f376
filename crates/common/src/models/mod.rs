pub mod order;
pub mod signal;
pub mod strategy;

pub use order::{Exchange, OrderAction, OrderRequest, OrderType};
pub use signal::{Signal, SignalSide};
pub use strategy::{ExecutionMode, Strategy, StrategyId};
