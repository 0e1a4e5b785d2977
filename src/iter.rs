use crate::grammar::Grammar;
use crate::symbol::{RuleId, Symbol, SymbolKey};
use std::hash::Hash;

/// Iterator that yields the terminals a rule derives, in order.
///
/// Descends into nonterminals with an explicit stack of the references it
/// has entered, so deep grammars do not recurse.
pub struct Expansion<'a, T> {
    grammar: &'a Grammar<T>,
    current: SymbolKey,
    stack: Vec<SymbolKey>,
}

impl<'a, T: Hash + Eq + Clone> Expansion<'a, T> {
    pub(crate) fn new(grammar: &'a Grammar<T>, rule: RuleId) -> Self {
        Self {
            grammar,
            current: grammar.first(rule),
            stack: Vec::new(),
        }
    }
}

impl<'a, T: Hash + Eq + Clone> Iterator for Expansion<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let grammar = self.grammar;
        loop {
            let node = &grammar.symbols[self.current];
            match &node.symbol {
                Symbol::Terminal(value) => {
                    self.current = node.next;
                    return Some(value);
                }
                Symbol::NonTerminal(rule) => {
                    self.stack.push(self.current);
                    self.current = grammar.first(*rule);
                }
                Symbol::Guard(_) => {
                    // End of a body: resume after the reference we came from
                    let parent = self.stack.pop()?;
                    self.current = grammar.next(parent);
                }
            }
        }
    }
}

impl<'a, T: Hash + Eq + Clone> IntoIterator for &'a Grammar<T> {
    type Item = &'a T;
    type IntoIter = Expansion<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
