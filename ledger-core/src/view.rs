//! Ledger views
//!
//! The engine only needs four operations on the ledger: read, insert, update
//! and erase. [`ReadView`] and [`ApplyView`] are that capability;
//! [`MemoryLedger`] is the in-memory implementation callers hand to the
//! engine, and [`crate::Sandbox`] the speculative one stacked on top.

use crate::{
    config::Fees,
    entries::LedgerEntry,
    error::{Error, Result},
    keylet::LedgerKey,
};
use std::collections::BTreeMap;

/// Read access to ledger state
pub trait ReadView {
    /// Raw entry stored under `key`
    fn read(&self, key: &LedgerKey) -> Option<Vec<u8>>;

    /// Reserve requirements in force for this ledger
    fn fees(&self) -> &Fees;
}

/// Write access to ledger state
pub trait ApplyView: ReadView {
    /// Insert a new entry; fails with [`Error::EntryExists`]
    fn insert(&mut self, key: LedgerKey, data: Vec<u8>) -> Result<()>;

    /// Replace an existing entry; fails with [`Error::EntryNotFound`]
    fn update(&mut self, key: LedgerKey, data: Vec<u8>) -> Result<()>;

    /// Remove an existing entry; fails with [`Error::EntryNotFound`]
    fn erase(&mut self, key: &LedgerKey) -> Result<()>;
}

/// Typed reads
pub trait ReadViewExt: ReadView {
    /// Decode the entry under `key`
    fn read_entry<E: LedgerEntry>(&self, key: &LedgerKey) -> Result<Option<E>> {
        match self.read(key) {
            Some(bytes) => Ok(Some(E::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Decode the entry under `key`, failing when it is missing
    fn require_entry<E: LedgerEntry>(&self, key: &LedgerKey) -> Result<E> {
        self.read_entry(key)?
            .ok_or_else(|| Error::EntryNotFound(format!("{} {}", E::KIND, key)))
    }

    /// Is there an entry under `key`
    fn exists(&self, key: &LedgerKey) -> bool {
        self.read(key).is_some()
    }
}

impl<V: ReadView + ?Sized> ReadViewExt for V {}

/// Typed writes
pub trait ApplyViewExt: ApplyView {
    /// Insert `entry` under its own key
    fn insert_entry<E: LedgerEntry>(&mut self, entry: &E) -> Result<()> {
        self.insert(entry.key(), entry.encode()?)
    }

    /// Replace the entry under `entry`'s key
    fn update_entry<E: LedgerEntry>(&mut self, entry: &E) -> Result<()> {
        self.update(entry.key(), entry.encode()?)
    }

    /// Insert or replace
    fn put_entry<E: LedgerEntry>(&mut self, entry: &E) -> Result<()> {
        let key = entry.key();
        if self.exists(&key) {
            self.update(key, entry.encode()?)
        } else {
            self.insert(key, entry.encode()?)
        }
    }
}

impl<V: ApplyView + ?Sized> ApplyViewExt for V {}

/// In-memory ledger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryLedger {
    entries: BTreeMap<LedgerKey, Vec<u8>>,
    fees: Fees,
}

impl MemoryLedger {
    /// Empty ledger with the given reserve requirements
    pub fn new(fees: Fees) -> Self {
        Self {
            entries: BTreeMap::new(),
            fees,
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&LedgerKey, &Vec<u8>)> {
        self.entries.iter()
    }
}

impl ReadView for MemoryLedger {
    fn read(&self, key: &LedgerKey) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn fees(&self) -> &Fees {
        &self.fees
    }
}

impl ApplyView for MemoryLedger {
    fn insert(&mut self, key: LedgerKey, data: Vec<u8>) -> Result<()> {
        if self.entries.contains_key(&key) {
            return Err(Error::EntryExists(key.to_string()));
        }
        self.entries.insert(key, data);
        Ok(())
    }

    fn update(&mut self, key: LedgerKey, data: Vec<u8>) -> Result<()> {
        match self.entries.get_mut(&key) {
            Some(slot) => {
                *slot = data;
                Ok(())
            }
            None => Err(Error::EntryNotFound(key.to_string())),
        }
    }

    fn erase(&mut self, key: &LedgerKey) -> Result<()> {
        self.entries
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| Error::EntryNotFound(key.to_string()))
    }
}
