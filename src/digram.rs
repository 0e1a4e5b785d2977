use crate::grammar::Grammar;
use crate::symbol::{DigramValue, SymbolKey};
use ahash::AHashMap as HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

pub(crate) type DigramKey<T> = (DigramValue<T>, DigramValue<T>);

/// Outcome of checking a freshly formed pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Check {
    /// Not a digram, or seen for the first time and now recorded.
    New,
    /// Already witnessed by this occurrence or an overlapping one.
    Known,
    /// A repeat was found and replaced by a rule reference.
    Replaced,
}

/// Maps each distinct digram to the one occurrence that witnesses it.
///
/// The witness is the left symbol of the pair.
#[derive(Debug)]
pub(crate) struct DigramIndex<T> {
    map: HashMap<DigramKey<T>, SymbolKey>,
}

impl<T: Hash + Eq> DigramIndex<T> {
    pub(crate) fn new() -> Self {
        Self {
            map: HashMap::default(),
        }
    }

    pub(crate) fn get(&self, key: &DigramKey<T>) -> Option<SymbolKey> {
        self.map.get(key).copied()
    }

    /// Sets the witness of `key`, returning the one it replaces.
    pub(crate) fn insert(&mut self, key: DigramKey<T>, witness: SymbolKey) -> Option<SymbolKey> {
        self.map.insert(key, witness)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&DigramKey<T>, SymbolKey)> {
        self.map.iter().map(|(key, &witness)| (key, witness))
    }
}

impl<T: Hash + Eq + Clone> Grammar<T> {
    /// The index key for the pair starting at `first`.
    ///
    /// Returns None when either member is a guard.
    pub(crate) fn digram_key(&self, first: SymbolKey) -> Option<DigramKey<T>> {
        let second = self.next(first);
        let left = self.symbols[first].symbol.digram_value()?;
        let right = self.symbols[second].symbol.digram_value()?;
        Some((left, right))
    }

    /// Returns the witness recorded for the pair starting at `first`.
    pub(crate) fn lookup_digram(&self, first: SymbolKey) -> Option<SymbolKey> {
        let key = self.digram_key(first)?;
        let witness = self.digrams.get(&key)?;
        debug_assert!(
            self.symbols.contains_key(witness)
                && self.digram_key(witness).as_ref() == Some(&key),
            "digram index entry does not match the pair at its witness"
        );
        Some(witness)
    }

    /// Records `first` as the witness of its pair, overwriting any previous one.
    pub(crate) fn record_digram(&mut self, first: SymbolKey) {
        if let Some(key) = self.digram_key(first) {
            self.digrams.insert(key, first);
        }
    }

    /// Removes the entry for the pair starting at `first`, but only if
    /// `first` is the recorded witness.
    pub(crate) fn forget_digram(&mut self, first: SymbolKey) {
        let Some(key) = self.digram_key(first) else {
            return;
        };

        if let Entry::Occupied(e) = self.digrams.map.entry(key) {
            if *e.get() == first {
                e.remove();
            }
        }
    }

    /// Restores digram uniqueness for the pair that was just formed at `first`.
    pub(crate) fn check(&mut self, first: SymbolKey) -> Check {
        let Some(key) = self.digram_key(first) else {
            return Check::New;
        };

        let Some(witness) = self.lookup_digram(first) else {
            self.digrams.insert(key, first);
            return Check::New;
        };

        let second = self.next(first);
        let overlapping = self.next(witness) == first || second == witness;

        if witness == first || overlapping {
            return Check::Known;
        }

        self.match_digram(first, witness);
        Check::Replaced
    }
}
