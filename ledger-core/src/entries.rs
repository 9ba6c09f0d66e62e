//! Ledger entries stored behind [`LedgerKey`]s
//!
//! Entries are plain serde structs; the view stores their bincode encoding.

use crate::{
    amount::Amount,
    error::Result,
    keylet::LedgerKey,
    types::{AccountId, Book, Currency},
};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// An entry that knows its own key
pub trait LedgerEntry: Serialize + DeserializeOwned {
    /// Entry kind, used in error messages
    const KIND: &'static str;

    /// Key this entry is stored under
    fn key(&self) -> LedgerKey;

    /// Encode for storage
    fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from storage
    fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Account root: native balance and owned-object count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRoot {
    /// Account
    pub account: AccountId,
    /// Balance in drops
    pub balance: i64,
    /// Objects owned (offers, trust lines) counted towards the reserve
    pub owner_count: u32,
    /// Next sequence number
    pub sequence: u32,
}

impl AccountRoot {
    /// New account holding `balance` drops
    pub fn new(account: AccountId, balance: i64) -> Self {
        Self {
            account,
            balance,
            owner_count: 0,
            sequence: 1,
        }
    }
}

impl LedgerEntry for AccountRoot {
    const KIND: &'static str = "AccountRoot";

    fn key(&self) -> LedgerKey {
        LedgerKey::account(&self.account)
    }
}

/// Trust line between two accounts for one currency
///
/// A positive balance means `high` owes `low`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustLine {
    /// Lower account ID
    pub low: AccountId,
    /// Higher account ID
    pub high: AccountId,
    /// Currency
    pub currency: Currency,
    /// Balance from `low`'s perspective
    pub balance: Decimal,
    /// How much of `high`'s IOUs `low` accepts
    pub low_limit: Decimal,
    /// How much of `low`'s IOUs `high` accepts
    pub high_limit: Decimal,
}

impl TrustLine {
    /// Empty line between `a` and `b`
    pub fn new(a: AccountId, b: AccountId, currency: Currency) -> Self {
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Self {
            low,
            high,
            currency,
            balance: Decimal::ZERO,
            low_limit: Decimal::ZERO,
            high_limit: Decimal::ZERO,
        }
    }

    /// Is `account` one side of this line
    pub fn involves(&self, account: &AccountId) -> bool {
        self.low == *account || self.high == *account
    }

    /// Balance from `account`'s perspective: positive when the other side
    /// owes `account`.
    pub fn balance_for(&self, account: &AccountId) -> Decimal {
        if *account == self.low {
            self.balance
        } else {
            -self.balance
        }
    }

    /// Limit `account` extends to the other side
    pub fn limit_of(&self, account: &AccountId) -> Decimal {
        if *account == self.low {
            self.low_limit
        } else {
            self.high_limit
        }
    }

    /// Set the limit `account` extends to the other side
    pub fn set_limit(&mut self, account: &AccountId, limit: Decimal) {
        if *account == self.low {
            self.low_limit = limit;
        } else {
            self.high_limit = limit;
        }
    }

    /// Most `sender` can move to the other side: what it is owed plus the
    /// other side's limit.
    pub fn capacity(&self, sender: &AccountId) -> Decimal {
        let receiver = if *sender == self.low { self.high } else { self.low };
        (self.balance_for(sender) + self.limit_of(&receiver)).max(Decimal::ZERO)
    }

    /// Move `value` from `sender` to the other side
    pub fn transfer(&mut self, sender: &AccountId, value: Decimal) {
        if *sender == self.low {
            self.balance -= value;
        } else {
            self.balance += value;
        }
    }
}

impl LedgerEntry for TrustLine {
    const KIND: &'static str = "TrustLine";

    fn key(&self) -> LedgerKey {
        LedgerKey::trust_line(&self.low, &self.high, &self.currency)
    }
}

/// Resting offer: the owner gives `taker_gets` in exchange for `taker_pays`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Offer owner
    pub owner: AccountId,
    /// Sequence the offer was created with
    pub sequence: u32,
    /// What a taker pays the owner
    pub taker_pays: Amount,
    /// What a taker gets from the owner
    pub taker_gets: Amount,
}

impl Offer {
    /// Book this offer rests in
    pub fn book(&self) -> Book {
        Book::new(self.taker_pays.issue(), self.taker_gets.issue())
    }

    /// Input per unit of output (`pays / gets`); `None` for an empty offer
    pub fn rate(&self) -> Option<Decimal> {
        if self.taker_gets.is_zero() {
            return None;
        }
        self.taker_pays.value().checked_div(self.taker_gets.value())
    }
}

impl LedgerEntry for Offer {
    const KIND: &'static str = "Offer";

    fn key(&self) -> LedgerKey {
        LedgerKey::offer(&self.owner, self.sequence)
    }
}

/// One offer in a book directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookOffer {
    /// Offer rate at placement
    pub rate: Decimal,
    /// Offer key
    pub key: LedgerKey,
}

/// Offers in one book, best rate first, ties in placement order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDirectory {
    /// Book
    pub book: Book,
    /// Offers in crossing order
    pub offers: Vec<BookOffer>,
}

impl BookDirectory {
    /// Empty directory
    pub fn new(book: Book) -> Self {
        Self {
            book,
            offers: Vec::new(),
        }
    }

    /// Insert behind every offer with an equal or better rate
    pub fn insert(&mut self, rate: Decimal, key: LedgerKey) {
        let position = self.offers.partition_point(|offer| offer.rate <= rate);
        self.offers.insert(position, BookOffer { rate, key });
    }

    /// Remove an offer; returns whether it was present
    pub fn remove(&mut self, key: &LedgerKey) -> bool {
        let before = self.offers.len();
        self.offers.retain(|offer| offer.key != *key);
        self.offers.len() != before
    }

    /// Best offer
    pub fn best(&self) -> Option<&BookOffer> {
        self.offers.first()
    }

    /// No offers left
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

impl LedgerEntry for BookDirectory {
    const KIND: &'static str = "BookDirectory";

    fn key(&self) -> LedgerKey {
        LedgerKey::book(&self.book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Issue;

    #[test]
    fn test_trust_line_perspective() {
        let alice = AccountId::from_seed("alice");
        let gateway = AccountId::from_seed("gateway");
        let usd = Currency::from_code("USD").unwrap();

        let mut line = TrustLine::new(alice, gateway, usd);
        line.set_limit(&alice, Decimal::from(1000));
        assert_eq!(line.limit_of(&alice), Decimal::from(1000));
        assert_eq!(line.limit_of(&gateway), Decimal::ZERO);

        // gateway issues 100 to alice
        assert_eq!(line.capacity(&gateway), Decimal::from(1000));
        line.transfer(&gateway, Decimal::from(100));
        assert_eq!(line.balance_for(&alice), Decimal::from(100));
        assert_eq!(line.balance_for(&gateway), Decimal::from(-100));

        // alice can redeem what she holds, nothing more
        assert_eq!(line.capacity(&alice), Decimal::from(100));
        assert_eq!(line.capacity(&gateway), Decimal::from(900));
    }

    #[test]
    fn test_entry_round_trip() {
        let offer = Offer {
            owner: AccountId::from_seed("maker"),
            sequence: 7,
            taker_pays: Amount::xrp(100),
            taker_gets: Amount::iou(
                Decimal::new(505, 1),
                Issue::new(Currency::from_code("USD").unwrap(), AccountId::from_seed("gw")),
            ),
        };
        let bytes = offer.encode().unwrap();
        assert_eq!(Offer::decode(&bytes).unwrap(), offer);
        assert_eq!(offer.key(), LedgerKey::offer(&offer.owner, 7));
    }

    #[test]
    fn test_directory_orders_by_rate_then_placement() {
        let book = Book::new(Issue::xrp(), Issue::xrp());
        let mut dir = BookDirectory::new(book);
        let k = |n: u8| LedgerKey::from_bytes([n; 32]);

        dir.insert(Decimal::from(2), k(1));
        dir.insert(Decimal::from(1), k(2));
        dir.insert(Decimal::from(2), k(3));
        dir.insert(Decimal::from(1), k(4));

        let keys: Vec<_> = dir.offers.iter().map(|o| o.key).collect();
        assert_eq!(keys, vec![k(2), k(4), k(1), k(3)]);
        assert_eq!(dir.best().unwrap().key, k(2));

        assert!(dir.remove(&k(2)));
        assert!(!dir.remove(&k(2)));
        assert_eq!(dir.best().unwrap().key, k(4));
    }
}
