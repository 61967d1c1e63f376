pub mod error;
pub mod remote;
pub mod traits;

pub use error::BackendError;
pub use remote::{Ack, BackendClient};
pub use traits::TradingBackend;
