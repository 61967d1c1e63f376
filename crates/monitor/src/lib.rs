pub mod catalog;
pub mod error;
pub mod events;
pub mod services;

/// Test doubles for `TradingBackend`, shared with downstream crates.
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::MonitorError;
pub use events::MonitorEvent;
