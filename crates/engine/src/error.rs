//! The module contains the error the engine can throw.
//!
//! Every variant maps to one caller-facing failure:
//!
//! - [`NotFound`] the entity is absent or not owned by the caller.
//! - [`DuplicateName`] an account with the same name already exists.
//! - [`InsufficientFunds`] an expense/transfer exceeds the source balance.
//! - [`Locked`] an edit was attempted after the editable window closed.
//! - [`AtomicCommitFailure`] the storage transaction failed and was rolled
//!   back.
//!
//!  [`NotFound`]: EngineError::NotFound
//!  [`DuplicateName`]: EngineError::DuplicateName
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`Locked`]: EngineError::Locked
//!  [`AtomicCommitFailure`]: EngineError::AtomicCommitFailure
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("\"{0}\" already present!")]
    DuplicateName(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),
    #[error("Locked: {0}")]
    Locked(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Atomic commit failed: {0}")]
    AtomicCommitFailure(#[from] DbErr),
}

impl EngineError {
    /// Returns `true` for storage failures whose details must not reach the
    /// caller.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::AtomicCommitFailure(_))
    }

    /// Caller-facing message. Storage failures collapse into a generic text.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(what) => format!("{what} not found"),
            Self::DuplicateName(name) => {
                format!("an account named '{name}' already exists")
            }
            Self::InvalidAmount(msg) => format!("invalid amount: {msg}"),
            Self::InsufficientFunds(account) => format!("insufficient funds in {account}"),
            Self::InvalidDestination(msg) => format!("invalid destination account: {msg}"),
            Self::Locked(_) => "transaction is locked (12h limit)".to_string(),
            Self::InvalidInput(msg) => msg.clone(),
            Self::AtomicCommitFailure(_) => "operation failed, nothing was changed".to_string(),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::DuplicateName(a), Self::DuplicateName(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::InvalidDestination(a), Self::InvalidDestination(b)) => a == b,
            (Self::Locked(a), Self::Locked(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::AtomicCommitFailure(a), Self::AtomicCommitFailure(b)) => {
                a.to_string() == b.to_string()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_hide_details() {
        let err = EngineError::from(DbErr::Custom("disk I/O error at page 7".to_string()));
        assert!(err.is_internal());
        assert!(!err.user_message().contains("page 7"));
    }

    #[test]
    fn typed_errors_have_distinct_messages() {
        let errors = [
            EngineError::NotFound("transaction".to_string()),
            EngineError::DuplicateName("Cash".to_string()),
            EngineError::InvalidAmount("must be > 0".to_string()),
            EngineError::InsufficientFunds("Cash".to_string()),
            EngineError::InvalidDestination("same as source".to_string()),
            EngineError::Locked("transaction".to_string()),
        ];
        let mut messages: Vec<String> = errors.iter().map(EngineError::user_message).collect();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), errors.len());
        assert!(errors.iter().all(|e| !e.is_internal()));
    }
}
