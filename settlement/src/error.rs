//! Error types for settlement engine

use crate::types::Ter;
use thiserror::Error;

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, Error>;

/// Settlement errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger error
    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger_core::Error),

    /// Step could not execute
    #[error("Step failed: {0}")]
    Step(Ter),

    /// Malformed strand
    #[error("Strand error: {0}")]
    Strand(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Metrics registration error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Result code reported when this error ends a strand execution
    pub fn ter(&self) -> Ter {
        match self {
            Error::Step(ter) => *ter,
            Error::Ledger(ledger_core::Error::NoLine(_)) => Ter::NoLine,
            Error::Ledger(ledger_core::Error::NoAccount(_)) => Ter::NoAccount,
            Error::Ledger(ledger_core::Error::InsufficientFunds(_)) => Ter::Unfunded,
            _ => Ter::Internal,
        }
    }

    /// Is this a broken engine invariant rather than a routing failure
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Ledger(ledger_core::Error::InvariantViolation(_))
        )
    }
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
