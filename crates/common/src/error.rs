use thiserror::Error;

/// Inline form errors. They block the submission only.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Instrument is required")]
    MissingInstrument,
    #[error("Quantity must be at least 1")]
    QuantityTooSmall,
    #[error("Price must be a non-negative number, got {0}")]
    InvalidPrice(f64),
    #[error("Unknown {field}: {value}")]
    UnknownValue { field: &'static str, value: String },
    #[error("Current password is incorrect")]
    IncorrectPassword,
    #[error("New passwords do not match")]
    PasswordMismatch,
    #[error("New password must be at least {0} characters long")]
    PasswordTooShort(usize),
}
