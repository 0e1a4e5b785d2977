use crate::digram::Check;
use crate::grammar::Grammar;
use crate::symbol::{RuleId, Symbol, SymbolKey, SymbolNode};
use log::trace;
use std::hash::Hash;

/// A production of the grammar.
///
/// The body is the circular list closed by `guard`; `count` is the number
/// of nonterminal symbols anywhere in the grammar that reference this rule.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Rule {
    pub guard: SymbolKey,
    pub count: u32,
}

impl<T: Hash + Eq + Clone> Grammar<T> {
    /// Allocates a rule with an empty body.
    pub(crate) fn new_rule(&mut self) -> RuleId {
        let id = self.rules.insert(Rule {
            guard: SymbolKey::default(),
            count: 0,
        });
        let guard = self
            .symbols
            .insert_with_key(|key| SymbolNode::detached(key, Symbol::Guard(id)));
        self.rules[id].guard = guard;
        id
    }

    /// Allocates a detached symbol, taking a reference if it is a nonterminal.
    pub(crate) fn new_symbol(&mut self, symbol: Symbol<T>) -> SymbolKey {
        if let Some(rule) = symbol.rule() {
            self.rules[rule].count += 1;
        }
        self.symbols
            .insert_with_key(|key| SymbolNode::detached(key, symbol))
    }

    /// Drops one reference to `rule`. Deleted rules are ignored.
    pub(crate) fn release(&mut self, rule: RuleId) {
        if let Some(rule) = self.rules.get_mut(rule) {
            assert!(rule.count > 0, "Cannot decrement count below 0");
            rule.count -= 1;
        }
    }

    pub(crate) fn first(&self, rule: RuleId) -> SymbolKey {
        self.next(self.rules[rule].guard)
    }

    pub(crate) fn last(&self, rule: RuleId) -> SymbolKey {
        self.prev(self.rules[rule].guard)
    }

    /// Resolves a repeated digram: `first` and `witness` start equal pairs.
    ///
    /// If the witness pair is the entire body of a rule that rule is reused,
    /// otherwise a new rule replaces both occurrences.
    pub(crate) fn match_digram(&mut self, first: SymbolKey, witness: SymbolKey) {
        let before = self.prev(witness);
        let after = self.next(self.next(witness));

        let rule = if self.is_guard(before) && self.is_guard(after) {
            let Symbol::Guard(rule) = self.symbols[before].symbol else {
                unreachable!("guard symbol without a rule");
            };
            trace!("reusing rule {:?}", rule);
            self.substitute(first, rule);
            rule
        } else {
            let rule = self.new_rule();
            let second = self.next(first);
            trace!("new rule {:?}", rule);

            let left = self.new_symbol(self.symbols[first].symbol.clone());
            let right = self.new_symbol(self.symbols[second].symbol.clone());
            let guard = self.rules[rule].guard;
            self.insert_after(guard, left);
            self.insert_after(left, right);

            self.substitute(witness, rule);
            self.substitute(first, rule);

            if self.rules.contains_key(rule) {
                let body_first = self.first(rule);
                self.record_digram(body_first);
            }
            rule
        };

        self.enforce_utility(rule);
    }

    /// Inlines the first symbol of `rule`'s body if its rule is now used
    /// only once.
    fn enforce_utility(&mut self, rule: RuleId) {
        if !self.rules.contains_key(rule) {
            return;
        }

        let body_first = self.first(rule);
        if self.is_underused(body_first) {
            self.expand(body_first);
        }
    }

    fn is_underused(&self, key: SymbolKey) -> bool {
        match self.symbols[key].symbol {
            Symbol::NonTerminal(rule) => self.rules[rule].count == 1,
            _ => false,
        }
    }

    /// Replaces the pair starting at `first` with a single reference to `rule`.
    fn substitute(&mut self, first: SymbolKey, rule: RuleId) {
        let before = self.prev(first);

        self.unlink(self.next(before));
        self.unlink(self.next(before));

        let key = self.new_symbol(Symbol::NonTerminal(rule));
        self.insert_after(before, key);

        // Also checked after a Known left pair, not only a New one, so the
        // pair at the new nonterminal is always indexed. A replacement on the
        // left already checked whatever now follows it.
        if self.check(before) != Check::Replaced {
            self.check(key);
        }
    }

    /// Inlines the rule referenced by `key` in place of `key`.
    ///
    /// The rule must have exactly one reference left; it is deleted.
    pub(crate) fn expand(&mut self, key: SymbolKey) {
        let Symbol::NonTerminal(rule) = self.symbols[key].symbol else {
            panic!("only nonterminals can be expanded");
        };
        debug_assert_eq!(self.rules[rule].count, 1, "expanding a shared rule");
        trace!("inlining rule {:?}", rule);

        let left = self.prev(key);
        let right = self.next(key);
        let body_first = self.first(rule);
        let body_last = self.last(rule);

        let Some(Rule { guard, .. }) = self.rules.remove(rule) else {
            unreachable!("rule checked above");
        };
        self.unlink(guard);

        self.forget_digram(key);
        self.unlink(key);

        self.join(left, body_first);
        self.join(body_last, right);

        self.record_digram(body_last);
    }
}
