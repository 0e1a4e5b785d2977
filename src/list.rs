use crate::grammar::Grammar;
use crate::symbol::SymbolKey;
use std::hash::Hash;

impl<T: Hash + Eq + Clone> Grammar<T> {
    #[inline]
    pub(crate) fn next(&self, key: SymbolKey) -> SymbolKey {
        self.symbols[key].next
    }

    #[inline]
    pub(crate) fn prev(&self, key: SymbolKey) -> SymbolKey {
        self.symbols[key].prev
    }

    #[inline]
    pub(crate) fn is_guard(&self, key: SymbolKey) -> bool {
        self.symbols[key].symbol.is_guard()
    }

    #[inline]
    fn same_value(&self, a: SymbolKey, b: SymbolKey) -> bool {
        self.symbols[a].symbol.same_value(&self.symbols[b].symbol)
    }

    /// Links `right` after `left`, replacing `left`'s current successor.
    ///
    /// The pair `left` used to start is forgotten first. Inside a run of three
    /// equal values only one of the two overlapping windows can be indexed, so
    /// when relinking breaks or creates such a run the surviving window is
    /// recorded again.
    pub(crate) fn join(&mut self, left: SymbolKey, right: SymbolKey) {
        self.forget_digram(left);

        let right_prev = self.prev(right);
        let right_next = self.next(right);
        if right_prev != right
            && self.same_value(right, right_prev)
            && self.same_value(right, right_next)
        {
            self.record_digram(right);
        }

        let left_prev = self.prev(left);
        let left_next = self.next(left);
        if left_prev != left
            && self.same_value(left, left_next)
            && self.same_value(left, left_prev)
        {
            self.record_digram(left_prev);
        }

        self.symbols[left].next = right;
        self.symbols[right].prev = left;
    }

    /// Splices the detached symbol `key` in right after `anchor`.
    pub(crate) fn insert_after(&mut self, anchor: SymbolKey, key: SymbolKey) {
        debug_assert!(
            self.prev(key) == key && self.next(key) == key,
            "only detached symbols can be inserted"
        );

        let after = self.next(anchor);
        self.symbols[key].next = after;
        self.symbols[after].prev = key;

        self.join(anchor, key);
    }

    /// Removes `key` from its list and drops it from the arena.
    ///
    /// Content symbols forget their outgoing pair and release the rule they
    /// reference, if that rule still exists.
    pub(crate) fn unlink(&mut self, key: SymbolKey) {
        let prev = self.prev(key);
        let next = self.next(key);
        self.join(prev, next);

        if !self.is_guard(key) {
            self.forget_digram(key);
            if let Some(rule) = self.symbols[key].symbol.rule() {
                self.release(rule);
            }
        }

        self.symbols.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::Grammar;
    use crate::symbol::Symbol;

    fn body(grammar: &Grammar<u8>) -> Vec<u8> {
        grammar.iter().copied().collect()
    }

    #[test]
    fn test_insert_after_guard_of_empty_rule() {
        let mut grammar = Grammar::<u8>::new();
        let guard = grammar.rules[grammar.start].guard;
        let key = grammar.new_symbol(Symbol::Terminal(b'x'));

        grammar.insert_after(guard, key);

        assert_eq!(grammar.next(guard), key);
        assert_eq!(grammar.prev(guard), key);
        assert_eq!(grammar.next(key), guard);
        assert_eq!(grammar.prev(key), guard);
    }

    #[test]
    fn test_unlink_closes_gap() {
        let mut grammar = Grammar::new();
        grammar.extend(*b"xyz");

        let x = grammar.first(grammar.start);
        let y = grammar.next(x);
        let z = grammar.next(y);

        grammar.unlink(y);

        assert_eq!(grammar.next(x), z);
        assert_eq!(grammar.prev(z), x);
        assert!(!grammar.symbols.contains_key(y));
        assert_eq!(body(&grammar), b"xz".to_vec());
    }

    #[test]
    fn test_unlink_forgets_outgoing_pair() {
        let mut grammar = Grammar::new();
        grammar.extend(*b"xyz");

        let x = grammar.first(grammar.start);
        let y = grammar.next(x);
        assert_eq!(grammar.lookup_digram(y), Some(y));

        let z = grammar.next(y);
        grammar.unlink(y);

        // neither x-y nor y-z survive; x-z was formed without a check
        assert!(grammar.digrams.iter().all(|(_, witness)| witness != y));
        assert_eq!(grammar.lookup_digram(x), None);
        assert_eq!(grammar.next(x), z);
    }

    #[test]
    fn test_join_records_surviving_window_of_run() {
        let mut grammar = Grammar::new();
        grammar.extend(*b"aaab");

        // a1 a2 a3 b: the (a, a) pair is witnessed by a1
        let a1 = grammar.first(grammar.start);
        let a2 = grammar.next(a1);
        assert_eq!(grammar.lookup_digram(a1), Some(a1));

        // dropping a1 breaks the indexed window, a2-a3 takes over
        grammar.unlink(a1);
        assert_eq!(grammar.lookup_digram(a2), Some(a2));
    }
}
