use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Failures surfaced by the time-tracking core. Nothing here is transient:
/// the caller decides how to present them and never retries.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    /// Malformed or out-of-range input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A quantity that is well-formed but semantically invalid.
    #[error("invalid amount {amount}: {reason}")]
    InvalidAmount { amount: Decimal, reason: &'static str },

    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    /// True for both plain validation failures and invalid amounts.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidAmount { .. })
    }
}
