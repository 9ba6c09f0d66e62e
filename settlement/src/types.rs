//! Settlement types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction result code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ter {
    /// Everything requested (or allowed) was delivered
    Success,
    /// No liquidity at all
    PathDry,
    /// Some but not all of the request was delivered and partial payments
    /// were not allowed
    PathPartial,
    /// Source cannot fund the payment
    Unfunded,
    /// Required trust line missing
    NoLine,
    /// Required account missing
    NoAccount,
    /// Engine invariant broken while executing a strand
    Internal,
}

impl Ter {
    /// Ledger token for this code
    pub fn token(&self) -> &'static str {
        match self {
            Ter::Success => "tesSUCCESS",
            Ter::PathDry => "tecPATH_DRY",
            Ter::PathPartial => "tecPATH_PARTIAL",
            Ter::Unfunded => "tecUNFUNDED",
            Ter::NoLine => "terNO_LINE",
            Ter::NoAccount => "terNO_ACCOUNT",
            Ter::Internal => "tecINTERNAL",
        }
    }

    /// Is this success
    pub fn is_success(&self) -> bool {
        *self == Ter::Success
    }
}

impl fmt::Display for Ter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens() {
        assert_eq!(Ter::Success.to_string(), "tesSUCCESS");
        assert_eq!(Ter::PathPartial.to_string(), "tecPATH_PARTIAL");
        assert!(Ter::Success.is_success());
        assert!(!Ter::PathDry.is_success());
    }
}
