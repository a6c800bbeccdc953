//! The module contains the errors the ledger can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when an account, category or user does not exist
//!   (or belongs to somebody else).
//! - [`SameAccount`] thrown when a transfer has the same source and destination.
//! - [`VersionConflict`] thrown when a conversation record changed under the
//!   caller's feet.
//!
//!  [`KeyNotFound`]: LedgerError::KeyNotFound
//!  [`SameAccount`]: LedgerError::SameAccount
//!  [`VersionConflict`]: LedgerError::VersionConflict
use sea_orm::DbErr;
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("source and destination account must differ")]
    SameAccount,
    #[error("conversation record for {0} was modified concurrently")]
    VersionConflict(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidData(a), Self::InvalidData(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::SameAccount, Self::SameAccount) => true,
            (Self::VersionConflict(a), Self::VersionConflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
