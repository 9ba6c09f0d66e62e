//! Core identifier types for the ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Total ordering (keys and book directories sort the same on every node)
//! - Cheap copies (fixed-size byte arrays)

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for byte in bytes {
        write!(f, "{:02X}", byte)?;
    }
    Ok(())
}

/// 160-bit account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId([u8; 20]);

impl AccountId {
    /// Pseudo-account that issues the native asset
    pub const XRP: AccountId = AccountId([0u8; 20]);

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derive a deterministic account ID from a seed string
    pub fn from_seed(seed: &str) -> Self {
        let digest = Sha256::digest(seed.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        Self(bytes)
    }

    /// Get bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Is this the native-asset pseudo-account
    pub fn is_xrp(&self) -> bool {
        *self == Self::XRP
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0[..8])
    }
}

/// 160-bit currency code
///
/// Three-letter codes live at bytes 12..15, everything else zero. The all-zero
/// code is the native asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Currency([u8; 20]);

impl Currency {
    /// Native asset
    pub const XRP: Currency = Currency([0u8; 20]);

    /// Parse a three-letter code. `"XRP"` is reserved and rejected.
    pub fn from_code(code: &str) -> Option<Self> {
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(|b| b.is_ascii_alphanumeric()) {
            return None;
        }
        if code == "XRP" {
            return None;
        }
        let mut raw = [0u8; 20];
        raw[12..15].copy_from_slice(bytes);
        Some(Self(raw))
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Get bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Is this the native asset
    pub fn is_xrp(&self) -> bool {
        *self == Self::XRP
    }

    /// Three-letter code, if this is a standard currency
    pub fn code(&self) -> Option<&str> {
        let standard = self.0[..12].iter().all(|b| *b == 0)
            && self.0[15..].iter().all(|b| *b == 0)
            && self.0[12..15].iter().all(|b| b.is_ascii_alphanumeric());
        if standard {
            std::str::from_utf8(&self.0[12..15]).ok()
        } else {
            None
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_xrp() {
            return write!(f, "XRP");
        }
        match self.code() {
            Some(code) => write!(f, "{}", code),
            None => write_hex(f, &self.0),
        }
    }
}

/// A currency together with its issuer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Issue {
    /// Currency code
    pub currency: Currency,
    /// Issuing account (`AccountId::XRP` for the native asset)
    pub account: AccountId,
}

impl Issue {
    /// Create a new issue
    pub fn new(currency: Currency, account: AccountId) -> Self {
        Self { currency, account }
    }

    /// The native asset
    pub fn xrp() -> Self {
        Self {
            currency: Currency::XRP,
            account: AccountId::XRP,
        }
    }

    /// Is this the native asset
    pub fn is_xrp(&self) -> bool {
        self.currency.is_xrp()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_xrp() {
            write!(f, "XRP")
        } else {
            write!(f, "{}/{}", self.currency, self.account)
        }
    }
}

/// Order book: takers pay `input` and get `output`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Book {
    /// Issue paid into the book by a taker
    pub input: Issue,
    /// Issue taken out of the book by a taker
    pub output: Issue,
}

impl Book {
    /// Create a new book
    pub fn new(input: Issue, output: Issue) -> Self {
        Self { input, output }
    }

    /// The book on the other side of the market
    pub fn reversed(&self) -> Self {
        Self {
            input: self.output,
            output: self.input,
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.input, self.output)
    }
}

/// Transaction context threaded through the engine for bookkeeping
///
/// Never interpreted by the payment engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxContext {
    /// Hash of the transaction being applied
    pub tx_hash: [u8; 32],
    /// Sequence of the ledger being built
    pub ledger_seq: u32,
}

impl TxContext {
    /// Create new context
    pub fn new(tx_hash: [u8; 32], ledger_seq: u32) -> Self {
        Self { tx_hash, ledger_seq }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_from_code() {
        let usd = Currency::from_code("USD").unwrap();
        assert_eq!(usd.code(), Some("USD"));
        assert_eq!(usd.to_string(), "USD");
        assert!(!usd.is_xrp());

        assert_eq!(Currency::from_code("XRP"), None);
        assert_eq!(Currency::from_code("US"), None);
        assert_eq!(Currency::from_code("U$D"), None);
        assert_eq!(Currency::XRP.to_string(), "XRP");
    }

    #[test]
    fn test_account_from_seed_is_deterministic() {
        let a = AccountId::from_seed("alice");
        assert_eq!(a, AccountId::from_seed("alice"));
        assert_ne!(a, AccountId::from_seed("bob"));
        assert!(!a.is_xrp());
        assert!(AccountId::XRP.is_xrp());
    }

    #[test]
    fn test_issue_and_book() {
        let gateway = AccountId::from_seed("gateway");
        let usd = Issue::new(Currency::from_code("USD").unwrap(), gateway);
        assert!(Issue::xrp().is_xrp());
        assert!(!usd.is_xrp());

        let book = Book::new(Issue::xrp(), usd);
        assert_eq!(book.reversed().input, usd);
        assert_eq!(book.reversed().reversed(), book);
    }
}
