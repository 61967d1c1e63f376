use backend::BackendError;
use common::error::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),
    #[error("Strategy {0} is not active")]
    NotActive(String),
}
