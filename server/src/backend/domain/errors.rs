//! Error taxonomy for the budget backend.
//!
//! Validation failures come from the domain model; read and write failures
//! come from whichever store adapter is configured. None of them are fatal:
//! a failed command leaves the in-memory state exactly as it was.

use super::models::ExpenseValidationError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BudgetError {
    #[error("Invalid record: {0}")]
    Validation(#[from] ExpenseValidationError),
    #[error("Store rejected the write: {0}")]
    RemoteWrite(String),
    #[error("Failed to read from store: {0}")]
    RemoteRead(String),
    #[error("No user is signed in")]
    NotSignedIn,
    #[error("The signed-in user changed before the request completed")]
    Superseded,
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl BudgetError {
    /// Failures the user can simply retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BudgetError::RemoteWrite(_) | BudgetError::RemoteRead(_) | BudgetError::Superseded
        )
    }
}
