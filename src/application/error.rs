use thiserror::Error;

use crate::domain::{Cents, HistoryError, LedgerError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient funds in {balance_name}: balance {available}, required {requested}")]
    InsufficientFunds {
        balance_name: String,
        available: Cents,
        requested: Cents,
    },

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("No charge records in the selected range")]
    EmptyHistory,

    #[error("Invalid charge record: {0}")]
    InvalidRecord(String),

    #[error("History totals overflow: {0} is too large")]
    Overflow(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True for caller mistakes (bad input, rules violated) as opposed to
    /// failures of the service itself.
    pub fn is_validation(&self) -> bool {
        !matches!(self, AppError::Internal(_))
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidAmount(amount) => {
                AppError::InvalidAmount(format!("{} cents (must be positive)", amount))
            }
            // The ledger does not know which side was debited; the service
            // rewrites this with a balance name when it has one.
            LedgerError::InsufficientFunds {
                available,
                requested,
            } => AppError::InsufficientFunds {
                balance_name: "wallet".to_string(),
                available,
                requested,
            },
            LedgerError::UnknownProvider(name) => AppError::UnknownProvider(name),
        }
    }
}

impl From<HistoryError> for AppError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::EmptyHistory => AppError::EmptyHistory,
            HistoryError::InvalidRecord(reason) => AppError::InvalidRecord(reason),
            HistoryError::Overflow(what) => AppError::Overflow(what.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(AppError::from(LedgerError::InvalidAmount(0)).is_validation());
        assert!(AppError::from(HistoryError::EmptyHistory).is_validation());
        assert!(!AppError::Internal(anyhow::anyhow!("boom")).is_validation());
    }

    #[test]
    fn test_ledger_error_conversion() {
        let err = AppError::from(LedgerError::InsufficientFunds {
            available: 10,
            requested: 20,
        });
        assert!(matches!(
            err,
            AppError::InsufficientFunds {
                available: 10,
                requested: 20,
                ..
            }
        ));
    }
}
