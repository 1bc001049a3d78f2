use crate::domain::money::Currency;
use crate::domain::user::{Role, UserId};
use miette::Diagnostic;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum WalletError {
    #[error("Insufficient {currency} funds: available {available}, required {required}")]
    #[diagnostic(
        code(wallet::insufficient_funds),
        help("Top up your wallet or buy more Z.")
    )]
    InsufficientFunds {
        currency: Currency,
        available: Decimal,
        required: Decimal,
    },
    #[error("Invalid amount: {0}")]
    #[diagnostic(code(wallet::invalid_amount))]
    InvalidAmount(String),
    #[error("A {role} account cannot {action}")]
    #[diagnostic(code(wallet::role_forbidden))]
    RoleForbidden { role: Role, action: &'static str },
    #[error("User {0} is already enrolled")]
    #[diagnostic(code(wallet::already_enrolled))]
    AlreadyEnrolled(UserId),
    #[error("{0} not found")]
    #[diagnostic(code(wallet::not_found))]
    NotFound(String),
    #[error("Invalid command: {0}")]
    #[diagnostic(code(wallet::invalid_command))]
    InvalidCommand(String),
    #[error("Configuration error: {0}")]
    #[diagnostic(code(wallet::config))]
    ConfigError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl WalletError {
    /// Domain rejections the caller can surface as a user-facing message.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            WalletError::InsufficientFunds { .. }
                | WalletError::InvalidAmount(_)
                | WalletError::RoleForbidden { .. }
                | WalletError::AlreadyEnrolled(_)
                | WalletError::NotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, WalletError>;
