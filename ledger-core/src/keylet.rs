//! Ledger entry addressing
//!
//! Every entry lives under a 256-bit key: SHA-256 over a one-byte namespace
//! followed by the fields that identify the entry.

use crate::types::{AccountId, Book, Currency};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

const SPACE_ACCOUNT: u8 = b'a';
const SPACE_TRUST_LINE: u8 = b'r';
const SPACE_OFFER: u8 = b'o';
const SPACE_BOOK: u8 = b'B';

/// Key of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LedgerKey([u8; 32]);

impl LedgerKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Account root of `account`
    pub fn account(account: &AccountId) -> Self {
        hash_key(SPACE_ACCOUNT, &[account.as_bytes()])
    }

    /// Trust line between two accounts; argument order does not matter
    pub fn trust_line(a: &AccountId, b: &AccountId, currency: &Currency) -> Self {
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        hash_key(
            SPACE_TRUST_LINE,
            &[low.as_bytes(), high.as_bytes(), currency.as_bytes()],
        )
    }

    /// Offer placed by `owner` with `sequence`
    pub fn offer(owner: &AccountId, sequence: u32) -> Self {
        hash_key(SPACE_OFFER, &[owner.as_bytes(), &sequence.to_be_bytes()])
    }

    /// Directory of offers in `book`
    pub fn book(book: &Book) -> Self {
        hash_key(
            SPACE_BOOK,
            &[
                book.input.currency.as_bytes(),
                book.input.account.as_bytes(),
                book.output.currency.as_bytes(),
                book.output.account.as_bytes(),
            ],
        )
    }
}

fn hash_key(space: u8, parts: &[&[u8]]) -> LedgerKey {
    let mut hasher = Sha256::new();
    hasher.update([0u8, space]);
    for part in parts {
        hasher.update(part);
    }
    LedgerKey(hasher.finalize().into())
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Issue;

    #[test]
    fn test_trust_line_key_is_symmetric() {
        let a = AccountId::from_seed("alice");
        let b = AccountId::from_seed("bob");
        let usd = Currency::from_code("USD").unwrap();
        assert_eq!(LedgerKey::trust_line(&a, &b, &usd), LedgerKey::trust_line(&b, &a, &usd));
        let eur = Currency::from_code("EUR").unwrap();
        assert_ne!(LedgerKey::trust_line(&a, &b, &usd), LedgerKey::trust_line(&a, &b, &eur));
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        let a = AccountId::from_seed("alice");
        assert_ne!(LedgerKey::account(&a), LedgerKey::offer(&a, 0));
        assert_ne!(LedgerKey::offer(&a, 1), LedgerKey::offer(&a, 2));

        let usd = Issue::new(Currency::from_code("USD").unwrap(), a);
        let book = Book::new(Issue::xrp(), usd);
        assert_ne!(LedgerKey::book(&book), LedgerKey::book(&book.reversed()));
    }
}
