use crate::digram::{DigramIndex, DigramKey};
use crate::error::{GrammarError, Result};
use crate::iter::Expansion;
use crate::rule::Rule;
use crate::symbol::{RuleId, Symbol, SymbolKey, SymbolNode};
use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use log::debug;
use slotmap::SlotMap;
use std::hash::Hash;

/// A straight-line grammar built incrementally from a sequence of terminals.
///
/// After every [`push`](Grammar::push) the grammar satisfies:
/// 1. **Digram Uniqueness**: no pair of adjacent symbols occurs twice
/// 2. **Rule Utility**: every rule except the start rule is referenced at least twice
///
/// Each instance owns all of its state, so independent grammars can be built
/// side by side.
pub struct Grammar<T> {
    /// Storage for every symbol of every rule body
    pub(crate) symbols: SlotMap<SymbolKey, SymbolNode<T>>,

    /// Live rules, including the start rule
    pub(crate) rules: SlotMap<RuleId, Rule>,

    /// Maps digrams to their witnessing occurrence
    pub(crate) digrams: DigramIndex<T>,

    /// The rule that derives the whole input
    pub(crate) start: RuleId,

    /// Number of terminals added
    length: usize,
}

impl<T: Hash + Eq + Clone> Grammar<T> {
    /// Creates a grammar whose start rule has an empty body.
    pub fn new() -> Self {
        let mut grammar = Self {
            symbols: SlotMap::with_key(),
            rules: SlotMap::with_key(),
            digrams: DigramIndex::new(),
            start: RuleId::default(),
            length: 0,
        };
        grammar.start = grammar.new_rule();
        grammar
    }

    /// Builds the grammar for a complete, non-empty input sequence.
    ///
    /// # Example
    ///
    /// ```
    /// use sequitur_grammar::{Grammar, GrammarError};
    ///
    /// let grammar = Grammar::build(b"abcab").unwrap();
    /// assert_eq!(grammar.to_text(), "0 -> 1 c 1 \n1 -> a b \n");
    ///
    /// assert_eq!(Grammar::<u8>::build(b"").err(), Some(GrammarError::EmptyInput));
    /// ```
    pub fn build(input: &[T]) -> Result<Self> {
        if input.is_empty() {
            return Err(GrammarError::EmptyInput);
        }

        let mut grammar = Self::new();
        grammar.extend(input.iter().cloned());

        debug!(
            "built grammar: {} terminals, {} rules",
            grammar.len(),
            grammar.rule_count()
        );
        Ok(grammar)
    }

    /// Appends a terminal and restores both grammar constraints.
    pub fn push(&mut self, value: T) {
        let key = self.new_symbol(Symbol::Terminal(value));
        let last = self.last(self.start);
        self.insert_after(last, key);
        self.length += 1;

        // The first terminal follows the guard, so there is nothing to check
        self.check(last);
    }

    /// Returns the number of terminals added.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if no terminals have been added.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the number of live rules, counting the start rule.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// The start rule; its expansion is the full input.
    pub fn start(&self) -> RuleId {
        self.start
    }

    /// Returns a read-only view of a rule, or None if `id` is a stale handle
    /// whose rule has been inlined.
    ///
    /// `id` must come from this grammar; a handle from another instance may
    /// name an unrelated rule.
    pub fn rule(&self, id: RuleId) -> Option<RuleView<'_, T>> {
        self.rules
            .contains_key(id)
            .then_some(RuleView { grammar: self, id })
    }

    /// Every rule reachable from the start rule, in display order.
    ///
    /// The start rule comes first; other rules follow in the order they are
    /// first referenced while reading the bodies in this same order.
    pub fn rules(&self) -> Vec<RuleId> {
        let mut order = vec![self.start];
        let mut seen: HashSet<RuleId> = HashSet::default();
        seen.insert(self.start);

        let mut i = 0;
        while i < order.len() {
            let guard = self.rules[order[i]].guard;
            let mut current = self.next(guard);
            while current != guard {
                if let Symbol::NonTerminal(rule) = self.symbols[current].symbol {
                    if seen.insert(rule) {
                        order.push(rule);
                    }
                }
                current = self.next(current);
            }
            i += 1;
        }

        order
    }

    /// Verifies every structural invariant of the grammar.
    ///
    /// # Panics
    ///
    /// Panics with a description of the first violation found.
    pub fn check_invariants(&self) {
        let mut references: HashMap<RuleId, u32> = HashMap::default();
        let mut occurrences: HashMap<DigramKey<T>, usize> = HashMap::default();

        for (id, rule) in &self.rules {
            let guard = rule.guard;
            assert!(
                matches!(self.symbols[guard].symbol, Symbol::Guard(owner) if owner == id),
                "rule {:?} has a foreign guard",
                id
            );

            let mut body_len = 0;
            let mut previous: Option<DigramKey<T>> = None;
            let mut current = guard;
            loop {
                let next = self.next(current);
                assert_eq!(self.prev(next), current, "broken back link in rule {:?}", id);
                if next == guard {
                    break;
                }
                assert!(!self.is_guard(next), "foreign guard inside rule {:?}", id);
                body_len += 1;

                if let Some(rule) = self.symbols[next].symbol.rule() {
                    assert!(self.rules.contains_key(rule), "reference to deleted rule");
                    *references.entry(rule).or_default() += 1;
                }

                // Overlapping windows inside a run count once
                let key = self.digram_key(next);
                match key {
                    Some(key) if previous.as_ref() == Some(&key) => previous = None,
                    Some(key) => {
                        *occurrences.entry(key.clone()).or_default() += 1;
                        previous = Some(key);
                    }
                    None => previous = None,
                }
                current = next;
            }

            if id != self.start {
                assert!(body_len >= 2, "rule {:?} has {} symbols", id, body_len);
            }
        }

        for (id, rule) in &self.rules {
            let counted = references.get(&id).copied().unwrap_or(0);
            assert_eq!(rule.count, counted, "rule {:?} has a stale reference count", id);
            if id != self.start {
                assert!(rule.count >= 2, "rule {:?} is used {} times", id, rule.count);
            }
        }

        for count in occurrences.values() {
            assert_eq!(*count, 1, "digram occurs {} times", count);
        }

        for (key, witness) in self.digrams.iter() {
            assert!(self.symbols.contains_key(witness), "index points at a deleted symbol");
            assert!(
                self.digram_key(witness).as_ref() == Some(key),
                "index entry does not match its witness"
            );
        }
    }

    /// Returns an iterator over the reconstructed input.
    pub fn iter(&self) -> Expansion<'_, T> {
        Expansion::new(self, self.start)
    }
}

/// One symbol of a rule body as seen from outside the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element<'a, T> {
    Terminal(&'a T),
    Rule(RuleId),
}

/// Borrowed view of a single rule.
pub struct RuleView<'a, T> {
    grammar: &'a Grammar<T>,
    id: RuleId,
}

impl<'a, T: Hash + Eq + Clone> RuleView<'a, T> {
    pub fn id(&self) -> RuleId {
        self.id
    }

    /// Number of nonterminals referencing this rule. Zero for the start rule.
    pub fn usage(&self) -> u32 {
        self.grammar.rules[self.id].count
    }

    pub fn is_start(&self) -> bool {
        self.id == self.grammar.start
    }

    /// Number of symbols in the body.
    pub fn len(&self) -> usize {
        self.symbols().count()
    }

    pub fn is_empty(&self) -> bool {
        let guard = self.grammar.rules[self.id].guard;
        self.grammar.next(guard) == guard
    }

    /// The body symbols in order.
    pub fn symbols(&self) -> Symbols<'a, T> {
        let guard = self.grammar.rules[self.id].guard;
        Symbols {
            grammar: self.grammar,
            current: self.grammar.next(guard),
            guard,
        }
    }

    /// The terminals this rule derives.
    pub fn expand(&self) -> Expansion<'a, T> {
        Expansion::new(self.grammar, self.id)
    }
}

/// Iterator over the body of one rule.
pub struct Symbols<'a, T> {
    grammar: &'a Grammar<T>,
    current: SymbolKey,
    guard: SymbolKey,
}

impl<'a, T: Hash + Eq + Clone> Iterator for Symbols<'a, T> {
    type Item = Element<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == self.guard {
            return None;
        }

        let node = &self.grammar.symbols[self.current];
        self.current = node.next;

        match &node.symbol {
            Symbol::Terminal(value) => Some(Element::Terminal(value)),
            Symbol::NonTerminal(rule) => Some(Element::Rule(*rule)),
            Symbol::Guard(_) => unreachable!("guard inside a rule body"),
        }
    }
}

impl<T: Hash + Eq + Clone> Default for Grammar<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq + Clone> Extend<T> for Grammar<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<T: Hash + Eq + Clone> FromIterator<T> for Grammar<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut grammar = Self::new();
        grammar.extend(iter);
        grammar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let grammar = Grammar::<char>::new();
        assert_eq!(grammar.len(), 0);
        assert!(grammar.is_empty());
        assert_eq!(grammar.rule_count(), 1);
        assert!(grammar.rule(grammar.start()).expect("start rule").is_empty());
    }

    #[test]
    fn test_build_rejects_empty_input() {
        assert_eq!(
            Grammar::<u8>::build(&[]).err(),
            Some(GrammarError::EmptyInput)
        );
    }

    #[test]
    fn test_single_symbol() {
        let grammar = Grammar::build(b"x").expect("non-empty input");
        let start = grammar.rule(grammar.start()).expect("start rule");

        assert_eq!(grammar.rule_count(), 1);
        assert_eq!(start.symbols().collect::<Vec<_>>(), vec![Element::Terminal(&b'x')]);
        assert_eq!(start.usage(), 0);
        grammar.check_invariants();
    }

    #[test]
    fn test_abcab() {
        let grammar = Grammar::build(b"abcab").expect("non-empty input");
        let rules = grammar.rules();
        assert_eq!(rules.len(), 2);

        let a = rules[1];
        let start: Vec<_> = grammar.rule(rules[0]).expect("start").symbols().collect();
        assert_eq!(
            start,
            vec![Element::Rule(a), Element::Terminal(&b'c'), Element::Rule(a)]
        );

        let aux = grammar.rule(a).expect("auxiliary rule");
        assert_eq!(
            aux.symbols().collect::<Vec<_>>(),
            vec![Element::Terminal(&b'a'), Element::Terminal(&b'b')]
        );
        assert_eq!(aux.usage(), 2);
        assert!(!aux.is_start());
    }

    #[test]
    fn test_abaaba_settles_after_every_symbol() {
        let input = b"abaaba";
        let mut grammar = Grammar::new();
        for &b in input {
            grammar.push(b);
            grammar.check_invariants();
        }

        let collected: Vec<u8> = grammar.iter().copied().collect();
        assert_eq!(collected, input.to_vec());
    }

    #[test]
    fn test_rules_lists_reachable_rules_once() {
        let grammar: Grammar<char> = "abcabcabcabc".chars().collect();
        let rules = grammar.rules();

        assert_eq!(rules[0], grammar.start());
        assert_eq!(rules.len(), grammar.rule_count());
        let unique: HashSet<_> = rules.iter().copied().collect();
        assert_eq!(unique.len(), rules.len());
    }

    #[test]
    fn test_stale_rule_handle() {
        let mut grammar = Grammar::new();
        grammar.extend(*b"abcab");
        let ab = grammar.rules()[1];

        // "abc" absorbs "ab" and the old handle dies with it
        grammar.extend(*b"c");
        assert!(grammar.rule(ab).is_none());
    }

    #[test]
    #[should_panic(expected = "index entry does not match its witness")]
    fn test_invariants_reject_mismatched_witness() {
        let mut grammar = Grammar::new();
        grammar.extend(*b"abcd");

        let a = grammar.first(grammar.start);
        let c = grammar.next(grammar.next(a));
        let key = grammar.digram_key(a).expect("a-b is a digram");

        grammar.digrams.insert(key, c);
        grammar.check_invariants();
    }

    #[test]
    #[should_panic(expected = "stale reference count")]
    fn test_invariants_reject_stale_count() {
        let mut grammar = Grammar::new();
        grammar.extend(*b"abcab");
        let ab = grammar.rules()[1];

        grammar.rules[ab].count += 1;
        grammar.check_invariants();
    }

    #[test]
    fn test_independent_instances() {
        let input = b"abracadabra abracadabra";
        let other = b"mississippi_mississippi";
        let alone = Grammar::build(input).expect("non-empty input");

        // feed two grammars in lockstep, one symbol each
        let mut first = Grammar::new();
        let mut second = Grammar::new();
        for (&a, &b) in input.iter().zip(other.iter()) {
            first.push(a);
            second.push(b);
        }

        assert_eq!(first.to_text(), alone.to_text());
        assert_eq!(second.to_text(), Grammar::build(other).expect("input").to_text());
        first.check_invariants();
        second.check_invariants();
    }
}
