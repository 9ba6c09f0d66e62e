//! Error types for the ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Entry expected in the view was not found
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    /// Insert of an entry that already exists
    #[error("Entry already exists: {0}")]
    EntryExists(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Arithmetic between amounts of different issues
    #[error("Issue mismatch: {0}")]
    IssueMismatch(String),

    /// Arithmetic overflow
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    /// No trust line between two accounts
    #[error("No trust line: {0}")]
    NoLine(String),

    /// Account root missing
    #[error("No account: {0}")]
    NoAccount(String),

    /// Balance too small for the requested debit
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Invariant violation (sandbox replay, conservation, etc.)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
