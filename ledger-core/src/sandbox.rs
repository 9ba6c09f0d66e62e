//! Speculative ledger views
//!
//! A [`Sandbox`] buffers writes on top of a parent view. Reads see the
//! buffer first, then the parent. Nothing reaches the parent until the
//! buffered [`WriteSet`] is taken out with [`Sandbox::into_writes`] and
//! replayed, in the order it was recorded, with [`WriteSet::apply_to`].
//! Dropping a sandbox discards its writes.
//!
//! Both `into_writes` and `apply_to` take their receiver by value, so a
//! sandbox cannot be applied twice and a child cannot be applied after it
//! has been discarded.

use crate::{
    config::Fees,
    error::{Error, Result},
    keylet::LedgerKey,
    view::{ApplyView, ReadView},
};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Write {
    Insert(Vec<u8>),
    Update(Vec<u8>),
    Erase,
}

impl Write {
    fn data(&self) -> Option<&Vec<u8>> {
        match self {
            Write::Insert(data) | Write::Update(data) => Some(data),
            Write::Erase => None,
        }
    }
}

/// Writes taken out of a sandbox, in recording order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSet {
    log: Vec<(LedgerKey, Write)>,
}

impl WriteSet {
    /// Number of buffered writes
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// No buffered writes
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Keys touched, in recording order
    pub fn keys(&self) -> impl Iterator<Item = &LedgerKey> {
        self.log.iter().map(|(key, _)| key)
    }

    /// Replay every write against `target`.
    ///
    /// The writes were valid against the view they were recorded on, so a
    /// rejection means `target` is not that view.
    pub fn apply_to(self, target: &mut dyn ApplyView) -> Result<()> {
        let count = self.log.len();
        for (key, write) in self.log {
            let outcome = match write {
                Write::Insert(data) => target.insert(key, data),
                Write::Update(data) => target.update(key, data),
                Write::Erase => target.erase(&key),
            };
            outcome.map_err(|e| {
                Error::InvariantViolation(format!("sandbox replay failed at {}: {}", key, e))
            })?;
        }
        tracing::trace!(writes = count, "Applied write set");
        Ok(())
    }
}

/// Copy-on-write view over a parent
pub struct Sandbox<'a> {
    parent: &'a dyn ReadView,
    writes: WriteSet,
    latest: HashMap<LedgerKey, usize>,
}

impl<'a> Sandbox<'a> {
    /// Empty sandbox over `parent`
    pub fn new(parent: &'a dyn ReadView) -> Self {
        Self {
            parent,
            writes: WriteSet::default(),
            latest: HashMap::new(),
        }
    }

    /// Empty sandbox stacked on this one
    pub fn child(&self) -> Sandbox<'_> {
        Sandbox::new(self)
    }

    /// Take the buffered writes, releasing the parent
    pub fn into_writes(self) -> WriteSet {
        self.writes
    }

    /// Merge a child's writes into this sandbox
    pub fn apply(&mut self, writes: WriteSet) -> Result<()> {
        writes.apply_to(self)
    }

    /// Number of buffered writes
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// No buffered writes
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    fn record(&mut self, key: LedgerKey, write: Write) {
        // An update over a buffered insert or update folds into it; the
        // key's position in the log does not change.
        if let (Some(&index), Write::Update(data)) = (self.latest.get(&key), &write) {
            match &mut self.writes.log[index].1 {
                Write::Insert(existing) | Write::Update(existing) => {
                    *existing = data.clone();
                    return;
                }
                Write::Erase => {}
            }
        }
        self.latest.insert(key, self.writes.log.len());
        self.writes.log.push((key, write));
    }
}

impl ReadView for Sandbox<'_> {
    fn read(&self, key: &LedgerKey) -> Option<Vec<u8>> {
        match self.latest.get(key) {
            Some(&index) => self.writes.log[index].1.data().cloned(),
            None => self.parent.read(key),
        }
    }

    fn fees(&self) -> &Fees {
        self.parent.fees()
    }
}

impl ApplyView for Sandbox<'_> {
    fn insert(&mut self, key: LedgerKey, data: Vec<u8>) -> Result<()> {
        if self.read(&key).is_some() {
            return Err(Error::EntryExists(key.to_string()));
        }
        self.record(key, Write::Insert(data));
        Ok(())
    }

    fn update(&mut self, key: LedgerKey, data: Vec<u8>) -> Result<()> {
        if self.read(&key).is_none() {
            return Err(Error::EntryNotFound(key.to_string()));
        }
        self.record(key, Write::Update(data));
        Ok(())
    }

    fn erase(&mut self, key: &LedgerKey) -> Result<()> {
        if self.read(key).is_none() {
            return Err(Error::EntryNotFound(key.to_string()));
        }
        self.record(*key, Write::Erase);
        Ok(())
    }
}

impl fmt::Debug for Sandbox<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sandbox")
            .field("writes", &self.writes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::MemoryLedger;

    fn key(n: u8) -> LedgerKey {
        LedgerKey::from_bytes([n; 32])
    }

    fn ledger() -> MemoryLedger {
        let mut ledger = MemoryLedger::default();
        ledger.insert(key(1), vec![1]).unwrap();
        ledger.insert(key(2), vec![2]).unwrap();
        ledger
    }

    #[test]
    fn test_reads_see_own_writes_first() {
        let base = ledger();
        let mut sandbox = Sandbox::new(&base);

        sandbox.update(key(1), vec![10]).unwrap();
        sandbox.erase(&key(2)).unwrap();
        sandbox.insert(key(3), vec![3]).unwrap();

        assert_eq!(sandbox.read(&key(1)), Some(vec![10]));
        assert_eq!(sandbox.read(&key(2)), None);
        assert_eq!(sandbox.read(&key(3)), Some(vec![3]));

        // parent untouched
        assert_eq!(base.read(&key(1)), Some(vec![1]));
        assert_eq!(base.read(&key(3)), None);
    }

    #[test]
    fn test_operation_preconditions() {
        let base = ledger();
        let mut sandbox = Sandbox::new(&base);

        assert!(matches!(
            sandbox.insert(key(1), vec![0]),
            Err(Error::EntryExists(_))
        ));
        assert!(matches!(
            sandbox.update(key(9), vec![0]),
            Err(Error::EntryNotFound(_))
        ));
        sandbox.erase(&key(1)).unwrap();
        assert!(matches!(sandbox.erase(&key(1)), Err(Error::EntryNotFound(_))));
        // erased keys can be inserted again
        sandbox.insert(key(1), vec![7]).unwrap();
        assert_eq!(sandbox.read(&key(1)), Some(vec![7]));
    }

    #[test]
    fn test_nested_apply_reaches_root() {
        let mut base = ledger();
        let writes = {
            let mut outer = Sandbox::new(&base);
            let inner_writes = {
                let mut inner = outer.child();
                inner.update(key(1), vec![11]).unwrap();
                inner.insert(key(4), vec![4]).unwrap();
                inner.into_writes()
            };
            outer.apply(inner_writes).unwrap();
            outer.erase(&key(2)).unwrap();
            outer.into_writes()
        };
        writes.apply_to(&mut base).unwrap();

        assert_eq!(base.read(&key(1)), Some(vec![11]));
        assert_eq!(base.read(&key(2)), None);
        assert_eq!(base.read(&key(4)), Some(vec![4]));
    }

    #[test]
    fn test_discarded_child_leaves_no_trace() {
        let base = ledger();
        let outer = Sandbox::new(&base);
        {
            let mut inner = outer.child();
            inner.erase(&key(1)).unwrap();
        }
        assert!(outer.is_empty());
        assert_eq!(outer.read(&key(1)), Some(vec![1]));
    }

    #[test]
    fn test_updates_fold_into_one_write() {
        let base = ledger();
        let mut sandbox = Sandbox::new(&base);
        sandbox.insert(key(5), vec![5]).unwrap();
        sandbox.update(key(5), vec![6]).unwrap();
        sandbox.update(key(1), vec![2]).unwrap();
        sandbox.update(key(1), vec![3]).unwrap();
        assert_eq!(sandbox.len(), 2);

        let writes = sandbox.into_writes();
        let keys: Vec<_> = writes.keys().copied().collect();
        assert_eq!(keys, vec![key(5), key(1)]);
    }

    #[test]
    fn test_replay_against_wrong_view_is_invariant_violation() {
        let base = ledger();
        let mut sandbox = Sandbox::new(&base);
        sandbox.insert(key(3), vec![3]).unwrap();
        let writes = sandbox.into_writes();

        let mut other = ledger();
        other.insert(key(3), vec![0]).unwrap();
        assert!(matches!(
            writes.apply_to(&mut other),
            Err(Error::InvariantViolation(_))
        ));
    }
}
